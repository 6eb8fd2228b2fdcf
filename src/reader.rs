use embedded_hal::delay::DelayNs;

use crate::model::TagId;

/// 读卡器硬件边界：在位信号 + UID 读取（无数据时返回空串）。
pub trait TagReader {
    fn card_present(&mut self) -> bool;
    fn read_uid(&mut self) -> String;
}

/// 读取 UID 并做噪声过滤。
///
/// 首次读取：空值直接放弃；否则等待 `reread_delay_ms` 后再读一次，
/// 两次结果完全一致且格式合法才接受。卡片在位期间的后续读取只读一次。
pub fn acquire<R, D>(
    reader: &mut R,
    delay: &mut D,
    is_first_read: bool,
    reread_delay_ms: u32,
) -> Option<TagId>
where
    R: TagReader + ?Sized,
    D: DelayNs + ?Sized,
{
    let first = reader.read_uid();
    if first.is_empty() {
        return None;
    }
    if !is_first_read {
        return TagId::parse(&first);
    }

    delay.delay_ms(reread_delay_ms);
    let second = reader.read_uid();
    if first != second {
        log::debug!("UID mismatch between reads: {:?} vs {:?}", first, second);
        return None;
    }
    TagId::parse(&first)
}
