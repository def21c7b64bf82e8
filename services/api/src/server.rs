use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::{TimeZone, Utc};
use tracing::info;
use uuid::Uuid;

use reembolso::admin::{admin_router, AdminRoutes, AdminService};
use reembolso::config::{AppConfig, AppEnvironment};
use reembolso::documents::{document_router, DocumentRoutes, DocumentService};
use reembolso::domain::{Caller, UserId};
use reembolso::error::AppError;
use reembolso::plans::{plan_router, PlanRoutes, PlanService};
use reembolso::reimbursements::{reimbursement_router, ReimbursementRoutes, RequestService};
use reembolso::reports::{report_router, ReportRoutes};
use reembolso::scheduler::{AccountPurge, ReminderSweep};
use reembolso::telemetry;
use reembolso::users::{UserProfile, UserRepository};

use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryDependentRepository, InMemoryDocumentRepository, InMemoryPlanRepository,
    InMemoryRequestRepository, InMemoryUserRepository, LocalFileStore, LoggingNotifier,
    NoopImageCodec, StaticIdentityProvider,
};
use crate::routes::base_router;

/// Composition root: collaborator adapters plus the services built on them.
pub(crate) struct Wiring {
    plans: Arc<InMemoryPlanRepository>,
    dependents: Arc<InMemoryDependentRepository>,
    requests: Arc<InMemoryRequestRepository>,
    users: Arc<InMemoryUserRepository>,
    notifier: Arc<LoggingNotifier>,
    identity: Arc<StaticIdentityProvider>,
    confirmation_grace: chrono::Duration,
    request_service: Arc<RequestService>,
    plan_service: Arc<PlanService>,
    document_service: Arc<DocumentService>,
    admin_service: Arc<AdminService>,
}

impl Wiring {
    pub(crate) fn build(config: &AppConfig) -> Self {
        let plans = Arc::new(InMemoryPlanRepository::default());
        let dependents = Arc::new(InMemoryDependentRepository::default());
        let requests = Arc::new(InMemoryRequestRepository::default());
        let documents = Arc::new(InMemoryDocumentRepository::default());
        let users = Arc::new(InMemoryUserRepository::default());
        let identity = Arc::new(StaticIdentityProvider::default());
        let files = Arc::new(LocalFileStore::new(config.documents.upload_path.clone()));
        let notifier = Arc::new(LoggingNotifier);

        let request_service = Arc::new(RequestService::new(
            requests.clone(),
            plans.clone(),
            dependents.clone(),
            documents.clone(),
            files.clone(),
            notifier.clone(),
            config.scheduler.default_reminder_interval_days,
        ));
        let plan_service = Arc::new(PlanService::new(
            plans.clone(),
            dependents.clone(),
            requests.clone(),
        ));
        let document_service = Arc::new(DocumentService::new(
            documents.clone(),
            requests.clone(),
            plans.clone(),
            files.clone(),
            Arc::new(NoopImageCodec),
            config.documents.max_document_bytes,
        ));
        let admin_service = Arc::new(AdminService::new(
            users.clone(),
            plans.clone(),
            dependents.clone(),
            requests.clone(),
            documents.clone(),
            files.clone(),
            identity.clone(),
        ));

        Self {
            plans,
            dependents,
            requests,
            users,
            notifier,
            identity,
            confirmation_grace: chrono::Duration::hours(config.scheduler.confirmation_grace_hours),
            request_service,
            plan_service,
            document_service,
            admin_service,
        }
    }

    pub(crate) fn router(&self) -> axum::Router {
        base_router()
            .merge(plan_router(PlanRoutes {
                service: self.plan_service.clone(),
                identity: self.identity.clone(),
            }))
            .merge(reimbursement_router(ReimbursementRoutes {
                service: self.request_service.clone(),
                identity: self.identity.clone(),
            }))
            .merge(document_router(DocumentRoutes {
                service: self.document_service.clone(),
                identity: self.identity.clone(),
            }))
            .merge(report_router(ReportRoutes {
                requests: self.request_service.clone(),
                plans: self.plan_service.clone(),
                identity: self.identity.clone(),
            }))
            .merge(admin_router(AdminRoutes {
                service: self.admin_service.clone(),
                identity: self.identity.clone(),
            }))
    }

    pub(crate) fn reminder_sweep(&self) -> ReminderSweep {
        ReminderSweep::new(
            self.requests.clone(),
            self.plans.clone(),
            self.dependents.clone(),
            self.notifier.clone(),
        )
    }

    pub(crate) fn account_purge(&self) -> AccountPurge {
        AccountPurge::new(
            self.users.clone(),
            self.identity.clone(),
            self.confirmation_grace,
        )
    }

    /// Seed two confirmed demo accounts so a fresh local instance is usable
    /// without a real identity service.
    pub(crate) fn seed_demo_accounts(&self) {
        let seeded_at = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid seed time");

        for (tag, name, email, is_admin, token) in [
            (
                0x01u128,
                "Usuária Demo",
                "demo@reembolso.example",
                false,
                "demo-user-token",
            ),
            (
                0x02u128,
                "Admin Demo",
                "admin@reembolso.example",
                true,
                "demo-admin-token",
            ),
        ] {
            let id = UserId(Uuid::from_u128(tag));
            let _ = self.users.insert(UserProfile {
                id,
                name: name.to_string(),
                email: email.to_string(),
                is_admin,
                created_at: seeded_at,
            });
            self.identity.confirm(id, seeded_at);
            self.identity.grant(
                token,
                if is_admin {
                    Caller::admin(id)
                } else {
                    Caller::user(id)
                },
            );
            info!(%token, %email, "demo credential available");
        }
    }
}

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let wiring = Wiring::build(&config);
    if config.environment != AppEnvironment::Production {
        wiring.seed_demo_accounts();
    }

    spawn_sweeps(&config, &wiring);

    let app = wiring
        .router()
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "reimbursement tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_sweeps(config: &AppConfig, wiring: &Wiring) {
    let reminder_period = Duration::from_secs(config.scheduler.reminder_sweep_hours * 3600);
    let reminder_sweep = wiring.reminder_sweep();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(reminder_period);
        // The first tick completes immediately; skip it so the sweep starts
        // one full period after boot.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let summary = reminder_sweep.run(Utc::now());
            info!(
                examined = summary.examined,
                sent = summary.sent,
                skipped = summary.skipped,
                failed = summary.failed,
                "reminder sweep finished"
            );
        }
    });

    let purge_period = Duration::from_secs(config.scheduler.housekeeping_sweep_hours * 3600);
    let account_purge = wiring.account_purge();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let summary = account_purge.run(Utc::now());
            info!(
                examined = summary.examined,
                purged = summary.purged,
                retained = summary.retained,
                failed = summary.failed,
                "housekeeping sweep finished"
            );
        }
    });
}

pub(crate) fn run_sweep_once(kind: crate::cli::SweepKind) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let wiring = Wiring::build(&config);
    let now = Utc::now();

    let summary = match kind {
        crate::cli::SweepKind::Reminders => {
            serde_json::to_value(wiring.reminder_sweep().run(now)).expect("summary serializes")
        }
        crate::cli::SweepKind::Housekeeping => {
            serde_json::to_value(wiring.account_purge().run(now)).expect("summary serializes")
        }
    };

    println!("{summary}");
    Ok(())
}
