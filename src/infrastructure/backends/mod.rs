pub mod anthropic;
pub mod event_stream;
pub mod openai;

use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;
use crate::domain::models::ChatSettings;

pub struct BackendManager {}

impl BackendManager {
    pub fn get(settings: &ChatSettings) -> BackendBox {
        match settings.backend {
            BackendName::OpenAI => {
                return Box::new(openai::OpenAI::new(
                    &settings.backend_url,
                    &settings.api_key,
                ));
            }
            BackendName::Anthropic => {
                return Box::new(anthropic::Anthropic::new(
                    &settings.backend_url,
                    &settings.api_key,
                ));
            }
        }
    }
}
