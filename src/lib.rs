// 刷卡终端核心：读卡过滤、在位状态、防重复上报、显示超时（不依赖 ESP-IDF）
pub mod display;
pub mod gate;
pub mod indicator;
pub mod lcd;
pub mod model;
pub mod presence;
pub mod reader;
pub mod report;
pub mod rfid;
pub mod roster;
pub mod terminal;
