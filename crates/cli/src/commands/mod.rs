pub mod config_cmd;
pub mod describe;
pub mod init;
pub mod run;
