use crate::client::executor::RequestExecutor;
use crate::client::transport::{HttpTransport, ReqwestTransport};
use crate::errors::ClientError;
use crate::managers::dispatcher::GenericDispatcher;
use crate::managers::endpoints::EndpointRegistry;
use crate::services::config::ClientConfig;
use crate::services::logger::Logger;
use crate::services::token::{EnvTokenProvider, TokenProvider};
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub registry: Arc<EndpointRegistry>,
    pub executor: RequestExecutor,
    pub dispatcher: GenericDispatcher,
}

impl App {
    pub fn from_env() -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_parts(
            Logger::new("fabricops"),
            ClientConfig::from_env(),
            EndpointRegistry::builtin(),
            Arc::new(transport),
            Arc::new(EnvTokenProvider::new()),
        ))
    }

    pub fn with_parts(
        logger: Logger,
        config: ClientConfig,
        registry: EndpointRegistry,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        let registry = Arc::new(registry);
        let executor = RequestExecutor::new(logger.clone(), config, transport, tokens);
        let dispatcher = GenericDispatcher::new(logger.clone(), registry.clone(), executor.clone());
        logger.debug(
            "Client initialized",
            Some(&serde_json::json!({ "endpoints": registry.len() })),
        );
        Self {
            logger,
            registry,
            executor,
            dispatcher,
        }
    }
}
