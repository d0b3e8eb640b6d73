pub mod aws_provider;
pub mod sdk_config;
