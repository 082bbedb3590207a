pub mod memory;
pub mod oracle;
pub mod sqlite;
pub mod transports;
