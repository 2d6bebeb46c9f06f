use crate::client::output::outputs::Output;
use crate::config::ConfigFile;

pub struct GlobalSettings {
    config: ConfigFile,
    printer: Box<dyn Output>,
}

impl GlobalSettings {
    pub fn new(config: ConfigFile, printer: Box<dyn Output>) -> Self {
        GlobalSettings { config, printer }
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn printer(&self) -> &dyn Output {
        self.printer.as_ref()
    }
}
