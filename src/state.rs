use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::OrmConn,
    integrations::{
        mailer::{self, Mailer},
        midtrans::{MidtransGateway, PaymentGateway},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub orm: Arc<OrmConn>,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<dyn Mailer>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    /// Wire the production integrations described by `config`.
    pub fn new(orm: OrmConn, config: AppConfig) -> anyhow::Result<Self> {
        let mailer = mailer::from_config(&config.email)?;
        let gateway: Arc<dyn PaymentGateway> =
            Arc::new(MidtransGateway::new(config.midtrans.clone())?);
        Ok(Self {
            orm: Arc::new(orm),
            config: Arc::new(config),
            mailer,
            gateway,
        })
    }

    /// The ORM connection, shared by every clone of the state.
    pub fn db(&self) -> &OrmConn {
        &self.orm
    }
}
