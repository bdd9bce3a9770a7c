pub mod bench_cmd;
pub mod init_cmd;
pub mod run_cmd;
