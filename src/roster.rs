use std::collections::HashMap;

use crate::model::TagId;

/// 名单未命中时显示的占位名。
pub const UNKNOWN_NAME: &str = "UNKNOWN";

// 出厂名单：标签序列号（4 字节 UID + BCC）-> 显示名。
const BUILTIN_MEMBERS: &[(&str, &str)] = &[
    ("3059e1a028", "T.Miura"),
    ("c0f8dda045", "Y.Sukegawa"),
    ("7015dea01b", "A.Satou"),
    ("b048dca084", "S.Kuchiki"),
    ("20e9eea087", "Y.Kon"),
    ("b0e4eea01a", "i.le-ho"),
    ("0032e2a070", "I.Ho-Ta"),
    ("f056eea0e8", "Y.Abe"),
    ("b0c2eca03e", "T.Itou"),
    ("7018e6a02e", "J.Uchikawa"),
    ("d0f9dda054", "K.Abe"),
    ("7064d9a06d", "T.Ohthuka"),
    ("10dfe9a086", "S.Itou"),
    ("10b3efa0ec", "M.Mishima"),
];

/// 标签 -> 姓名映射（键统一为小写十六进制）。
#[derive(Clone, Debug, Default)]
pub struct Roster {
    names: HashMap<String, String>,
}

impl Roster {
    pub fn builtin() -> Self {
        BUILTIN_MEMBERS.iter().copied().collect()
    }

    pub fn insert(&mut self, uid: &str, name: impl Into<String>) {
        self.names.insert(uid.trim().to_ascii_lowercase(), name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 查询显示名，未登记返回 `UNKNOWN`。
    pub fn lookup(&self, tag: &TagId) -> &str {
        self.names
            .get(tag.as_str())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_NAME)
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Roster {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut roster = Roster::default();
        for (uid, name) in iter {
            roster.insert(uid, name);
        }
        roster
    }
}
