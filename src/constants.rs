// Command opcodes (compact protocol)
pub const CMD_SET_TARGET: u8 = 0x84;
pub const CMD_SET_SPEED: u8 = 0x87;
pub const CMD_SET_ACCELERATION: u8 = 0x89;
pub const CMD_GET_POSITION: u8 = 0x90;
pub const CMD_GET_MOVING_STATE: u8 = 0x93;
pub const CMD_GET_ERRORS: u8 = 0xA1;
pub const CMD_GO_HOME: u8 = 0xA2;

// Reply sizes, no length prefix on the wire
pub const POSITION_REPLY_LEN: usize = 2;
pub const MOVING_STATE_REPLY_LEN: usize = 1;
pub const ERRORS_REPLY_LEN: usize = 2;

// Payload values are two 7-bit bytes
pub const VALUE_LIMIT: i64 = 1 << 14;
pub const PAYLOAD_MASK: u16 = 0x7F;

// Unit scaling into device units
pub const QUARTER_US_PER_US: f64 = 4.0;
pub const SPEED_SCALE: f64 = 4.0 * 10.0;
pub const ACCELERATION_SCALE: f64 = 4.0 * 10.0 * 80.0;

// Serial defaults
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;
