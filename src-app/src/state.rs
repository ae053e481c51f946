use anyhow::Context;
use cairn_cache::{PendingTracker, ViewHost};
use cairn_config::{AppConfig, ConfigManager};
use cairn_core::UserProfile;
use cairn_email::{FixtureMailService, GmailClient, MailService};
use cairn_view::AppCoordinator;
use std::sync::Arc;

pub struct AppState {
    pub(crate) config_manager: ConfigManager,
    pub(crate) config: AppConfig,
    pub(crate) host: Arc<ViewHost>,
    pub(crate) tracker: PendingTracker,
    pub(crate) coordinator: AppCoordinator,
}

impl AppState {
    pub async fn initialize() -> anyhow::Result<Self> {
        let config_manager = ConfigManager::new().context("initialize config manager")?;
        let config = config_manager.load().context("load app config")?;

        let (tracker, pending) = PendingTracker::new();
        let host = Arc::new(ViewHost::new(pending));
        let mut coordinator = AppCoordinator::new(
            host.clone(),
            config.ui.default_label_ids.clone(),
            config.ui.relative_date_window_days,
        );

        let (client, profile) = connect_mail_service(&config)
            .await
            .context("connect mail service")?;
        coordinator.set_profile(profile);
        coordinator.attach_client(client);

        Ok(Self {
            config_manager,
            config,
            host,
            tracker,
            coordinator,
        })
    }
}

async fn connect_mail_service(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn MailService>, Option<UserProfile>)> {
    if config.fixtures.enabled {
        let directory = config
            .fixtures
            .directory
            .clone()
            .context("fixtures are enabled but no fixture directory is configured")?;
        tracing::info!(directory = %directory.display(), "serving mail from fixtures");
        let fixtures = FixtureMailService::new(directory);
        let profile = fixtures
            .users()
            .await
            .context("load fixture users")?
            .into_iter()
            .next();
        return Ok((Arc::new(fixtures), profile));
    }

    let client = GmailClient::new(&config.service.api_base, config.service.max_thread_results);
    match std::env::var(&config.service.access_token_env) {
        Ok(token) if !token.trim().is_empty() => client.sign_in(token.trim().to_string()),
        _ => tracing::warn!(
            env = %config.service.access_token_env,
            "no access token in environment, starting signed out"
        ),
    }
    Ok((Arc::new(client), None))
}
