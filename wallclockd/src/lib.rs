mod daemon;

pub use daemon::main as daemon_main;
