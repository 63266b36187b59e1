use std::sync::Arc;

use crate::config::Settings;
use crate::directory::DeviceDirectory;
use crate::dispatch::DispatchPipeline;
use crate::push::PushTransport;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub pipeline: Arc<DispatchPipeline>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        directory: Arc<dyn DeviceDirectory>,
        transport: Arc<dyn PushTransport>,
    ) -> Self {
        let pipeline = Arc::new(DispatchPipeline::new(
            directory,
            transport,
            &settings.dispatch,
        ));

        Self {
            settings: Arc::new(settings),
            pipeline,
        }
    }
}
