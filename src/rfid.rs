//! MFRC522 读卡芯片驱动（I2C，M5Stack RFID 单元默认地址 0x28）。
//!
//! 只实现终端需要的部分：WUPA 探测、一级防冲突读取 UID、HLTA。
//! 每次操作结束都发送 HLTA，使一直放在读卡器上的卡片仍会响应下一次 WUPA。

use embedded_hal::i2c::I2c;

use crate::reader::TagReader;

pub const DEFAULT_ADDRESS: u8 = 0x28;

// 寄存器地址
const COMMAND_REG: u8 = 0x01;
const COM_IRQ_REG: u8 = 0x04;
const ERROR_REG: u8 = 0x06;
const FIFO_DATA_REG: u8 = 0x09;
const FIFO_LEVEL_REG: u8 = 0x0A;
const BIT_FRAMING_REG: u8 = 0x0D;
const COLL_REG: u8 = 0x0E;
const MODE_REG: u8 = 0x11;
const TX_CONTROL_REG: u8 = 0x14;
const TX_ASK_REG: u8 = 0x15;
const T_MODE_REG: u8 = 0x2A;
const T_PRESCALER_REG: u8 = 0x2B;
const T_RELOAD_REG_H: u8 = 0x2C;
const T_RELOAD_REG_L: u8 = 0x2D;
const VERSION_REG: u8 = 0x37;

// 芯片命令
const CMD_IDLE: u8 = 0x00;
const CMD_TRANSCEIVE: u8 = 0x0C;
const CMD_SOFT_RESET: u8 = 0x0F;

// ISO 14443A 命令
const PICC_WUPA: u8 = 0x52;
const PICC_SEL_CL1: u8 = 0x93;
// HLTA 帧（0x50 0x00）及其预先计算的 CRC_A
const PICC_HLTA_FRAME: [u8; 4] = [0x50, 0x00, 0x57, 0xCD];

// ComIrqReg 位
const IRQ_RX: u8 = 0x20;
const IRQ_IDLE: u8 = 0x10;
const IRQ_TIMER: u8 = 0x01;
// ErrorReg: BufferOvfl | ParityErr | ProtocolErr
const ERROR_MASK: u8 = 0x13;
const ERROR_COLL: u8 = 0x08;

// 等待中断的最大轮询次数（芯片定时器约 25ms 先触发）
const MAX_IRQ_POLLS: u16 = 2000;

/// 读卡芯片通信错误。
#[derive(Debug)]
pub enum RfidError<E> {
    Bus(E),
    Timeout,
    Protocol(u8),
    Collision,
    BadBcc,
    BadLength(usize),
}

impl<E> From<E> for RfidError<E> {
    fn from(err: E) -> Self {
        RfidError::Bus(err)
    }
}

pub struct Mfrc522<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Mfrc522<I> {
    pub fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// 复位并配置芯片，返回版本号（0x91/0x92 为正版芯片）。
    pub fn init(&mut self) -> Result<u8, RfidError<I::Error>> {
        self.write_reg(COMMAND_REG, CMD_SOFT_RESET)?;
        // 复位后等待 PowerDown 位清除
        let mut polls = 0;
        while self.read_reg(COMMAND_REG)? & 0x10 != 0 {
            polls += 1;
            if polls > MAX_IRQ_POLLS {
                return Err(RfidError::Timeout);
            }
        }
        // 定时器：TPrescaler=0xA9、Reload=1000，约 25ms 超时
        self.write_reg(T_MODE_REG, 0x80)?;
        self.write_reg(T_PRESCALER_REG, 0xA9)?;
        self.write_reg(T_RELOAD_REG_H, 0x03)?;
        self.write_reg(T_RELOAD_REG_L, 0xE8)?;
        // 100% ASK 调制，CRC 预置值 0x6363
        self.write_reg(TX_ASK_REG, 0x40)?;
        self.write_reg(MODE_REG, 0x3D)?;
        self.antenna_on()?;
        let version = self.read_reg(VERSION_REG)?;
        log::info!("MFRC522 version 0x{:02X}", version);
        Ok(version)
    }

    /// WUPA 探测是否有卡（ATQA 为 2 字节）。
    pub fn detect_card(&mut self) -> Result<bool, RfidError<I::Error>> {
        let mut atqa = [0u8; 2];
        let result = self.transceive(&[PICC_WUPA], 0x07, &mut atqa);
        self.halt();
        match result {
            Ok(2) => Ok(true),
            Ok(_) | Err(RfidError::Timeout) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// 读取 5 字节序列号（4 字节 UID + BCC）。
    pub fn read_serial(&mut self) -> Result<[u8; 5], RfidError<I::Error>> {
        let result = self.wake_and_anticollide();
        self.halt();
        result
    }

    fn wake_and_anticollide(&mut self) -> Result<[u8; 5], RfidError<I::Error>> {
        let mut atqa = [0u8; 2];
        let len = self.transceive(&[PICC_WUPA], 0x07, &mut atqa)?;
        if len != 2 {
            return Err(RfidError::BadLength(len));
        }
        // 冲突后的位全部清零
        self.clear_bits(COLL_REG, 0x80)?;
        let mut serial = [0u8; 5];
        let len = self.transceive(&[PICC_SEL_CL1, 0x20], 0x00, &mut serial)?;
        if len != serial.len() {
            return Err(RfidError::BadLength(len));
        }
        let bcc = serial[..4].iter().fold(0u8, |acc, b| acc ^ b);
        if bcc != serial[4] {
            return Err(RfidError::BadBcc);
        }
        Ok(serial)
    }

    /// HLTA 不期望应答，超时即正常结果。
    fn halt(&mut self) {
        let mut none = [0u8; 1];
        match self.transceive(&PICC_HLTA_FRAME, 0x00, &mut none) {
            Ok(_) | Err(RfidError::Timeout) => {}
            Err(err) => log::debug!("HLTA failed: {:?}", err),
        }
    }

    fn transceive(
        &mut self,
        data: &[u8],
        bit_framing: u8,
        response: &mut [u8],
    ) -> Result<usize, RfidError<I::Error>> {
        self.write_reg(COMMAND_REG, CMD_IDLE)?;
        self.write_reg(COM_IRQ_REG, 0x7F)?;
        self.write_reg(FIFO_LEVEL_REG, 0x80)?;
        self.write_fifo(data)?;
        self.write_reg(BIT_FRAMING_REG, bit_framing)?;
        self.write_reg(COMMAND_REG, CMD_TRANSCEIVE)?;
        self.write_reg(BIT_FRAMING_REG, bit_framing | 0x80)?;

        let mut polls = 0;
        loop {
            let irq = self.read_reg(COM_IRQ_REG)?;
            if irq & (IRQ_RX | IRQ_IDLE) != 0 {
                break;
            }
            if irq & IRQ_TIMER != 0 {
                return Err(RfidError::Timeout);
            }
            polls += 1;
            if polls > MAX_IRQ_POLLS {
                return Err(RfidError::Timeout);
            }
        }
        self.clear_bits(BIT_FRAMING_REG, 0x80)?;

        let error = self.read_reg(ERROR_REG)?;
        if error & ERROR_MASK != 0 {
            return Err(RfidError::Protocol(error));
        }
        if error & ERROR_COLL != 0 {
            return Err(RfidError::Collision);
        }

        let level = self.read_reg(FIFO_LEVEL_REG)? as usize;
        let count = level.min(response.len());
        if count > 0 {
            self.i2c
                .write_read(self.address, &[FIFO_DATA_REG], &mut response[..count])?;
        }
        Ok(level)
    }

    fn antenna_on(&mut self) -> Result<(), RfidError<I::Error>> {
        let value = self.read_reg(TX_CONTROL_REG)?;
        if value & 0x03 != 0x03 {
            self.write_reg(TX_CONTROL_REG, value | 0x03)?;
        }
        Ok(())
    }

    fn clear_bits(&mut self, reg: u8, mask: u8) -> Result<(), RfidError<I::Error>> {
        let value = self.read_reg(reg)?;
        self.write_reg(reg, value & !mask)
    }

    fn write_fifo(&mut self, data: &[u8]) -> Result<(), RfidError<I::Error>> {
        let mut frame = [0u8; 8];
        frame[0] = FIFO_DATA_REG;
        frame[1..=data.len()].copy_from_slice(data);
        self.i2c.write(self.address, &frame[..=data.len()])?;
        Ok(())
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), RfidError<I::Error>> {
        self.i2c.write(self.address, &[reg, value])?;
        Ok(())
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, RfidError<I::Error>> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(self.address, &[reg], &mut buf)?;
        Ok(buf[0])
    }
}

impl<I: I2c> TagReader for Mfrc522<I> {
    fn card_present(&mut self) -> bool {
        match self.detect_card() {
            Ok(present) => present,
            Err(err) => {
                log::debug!("RFID presence check error: {:?}", err);
                false
            }
        }
    }

    /// 序列号格式化为 10 位小写十六进制；读取失败返回空串。
    fn read_uid(&mut self) -> String {
        match self.read_serial() {
            Ok(serial) => format_serial(&serial),
            Err(err) => {
                log::debug!("RFID read error: {:?}", err);
                String::new()
            }
        }
    }
}

pub fn format_serial(serial: &[u8]) -> String {
    use std::fmt::Write as _;

    let mut out = String::with_capacity(serial.len() * 2);
    for byte in serial {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
