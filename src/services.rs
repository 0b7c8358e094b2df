pub mod bootstrap;
pub mod extractor;
pub mod hooks;
pub mod logger;
pub mod provisioner;
