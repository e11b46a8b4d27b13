//! SX127x register map (LoRa mode), as far as the driver uses it.

/// Set on the address byte of a register write.
pub const WRITE_MASK: u8 = 0x80;

pub const REG_FIFO: u8 = 0x00;
pub const REG_OP_MODE: u8 = 0x01;
pub const REG_FRF_MSB: u8 = 0x06;
pub const REG_FRF_MID: u8 = 0x07;
pub const REG_FRF_LSB: u8 = 0x08;
pub const REG_PA_CONFIG: u8 = 0x09;
pub const REG_FIFO_ADDR_PTR: u8 = 0x0d;
pub const REG_FIFO_TX_BASE_ADDR: u8 = 0x0e;
pub const REG_FIFO_RX_BASE_ADDR: u8 = 0x0f;
pub const REG_FIFO_RX_CURRENT_ADDR: u8 = 0x10;
pub const REG_IRQ_FLAGS: u8 = 0x12;
pub const REG_RX_NB_BYTES: u8 = 0x13;
pub const REG_PKT_SNR_VALUE: u8 = 0x19;
pub const REG_PKT_RSSI_VALUE: u8 = 0x1a;
pub const REG_MODEM_CONFIG1: u8 = 0x1d;
pub const REG_MODEM_CONFIG2: u8 = 0x1e;
pub const REG_PREAMBLE_MSB: u8 = 0x20;
pub const REG_PREAMBLE_LSB: u8 = 0x21;
pub const REG_PAYLOAD_LENGTH: u8 = 0x22;
pub const REG_MODEM_CONFIG3: u8 = 0x26;
pub const REG_DIO_MAPPING1: u8 = 0x40;
pub const REG_PA_DAC: u8 = 0x4d;

// RegOpMode
pub const LONG_RANGE_MODE: u8 = 0x80;
pub const MODE_SLEEP: u8 = 0x00;
pub const MODE_STDBY: u8 = 0x01;
pub const MODE_TX: u8 = 0x03;
pub const MODE_RXCONTINUOUS: u8 = 0x05;

// RegIrqFlags
pub const IRQ_RX_TIMEOUT: u8 = 0x80;
pub const IRQ_RX_DONE: u8 = 0x40;
pub const IRQ_PAYLOAD_CRC_ERROR: u8 = 0x20;
pub const IRQ_TX_DONE: u8 = 0x08;
pub const IRQ_CLEAR_ALL: u8 = 0xff;

// RegDioMapping1, DIO0 field
pub const DIO0_RX_DONE: u8 = 0x00;
pub const DIO0_TX_DONE: u8 = 0x40;

// RegPaConfig / RegPaDac
pub const PA_SELECT: u8 = 0x80;
pub const PA_DAC_DISABLE: u8 = 0x04;
pub const PA_DAC_ENABLE: u8 = 0x07;

/// Bw125Cr45Sf128: 125 kHz, 4/5 coding rate, SF7, CRC on.
pub const MODEM_CONFIG_DEFAULT: [u8; 3] = [0x72, 0x74, 0x04];

pub const PREAMBLE_LEN: u16 = 8;

/// Crystal frequency over 2^19, in Hz.
pub const FSTEP_HZ: f64 = 32_000_000.0 / 524_288.0;

/// Frequency band the chip can synthesize, in MHz.
pub const FREQUENCY_MIN_MHZ: f32 = 137.0;
pub const FREQUENCY_MAX_MHZ: f32 = 1020.0;

/// At or above this frequency the HF port is in use, which changes the RSSI offset.
pub const HF_PORT_MIN_MHZ: f32 = 779.0;
pub const RSSI_OFFSET_HF: i16 = 157;
pub const RSSI_OFFSET_LF: i16 = 164;
