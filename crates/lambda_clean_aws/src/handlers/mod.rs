pub mod scheduled;
