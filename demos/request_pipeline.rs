use ferrous_ioc::{
    Constant, Container, ContainerOptions, Interface, LifetimeScope, LoggingObserver, MetricsObserver,
    RegisterOptions,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ===== Domain Types =====

#[derive(Debug, Clone)]
struct User {
    id: String,
    name: String,
}

#[derive(Debug)]
struct RequestContext {
    request_id: u64,
    path: String,
}

#[derive(Debug)]
struct NotFound(String);

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no user with id {}", self.0)
    }
}

impl std::error::Error for NotFound {}

// ===== Services =====

trait UserRepository: Send + Sync {
    fn find_by_id(&self, id: &str) -> Option<User>;
}

struct InMemoryUserRepository {
    users: HashMap<String, User>,
}

impl InMemoryUserRepository {
    fn new() -> Self {
        let mut users = HashMap::new();
        for (id, name) in [("1", "Alice"), ("2", "Bob"), ("3", "Charlie")] {
            users.insert(
                id.to_string(),
                User {
                    id: id.to_string(),
                    name: name.to_string(),
                },
            );
        }
        println!("  [root] user repository created");
        Self { users }
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_id(&self, id: &str) -> Option<User> {
        self.users.get(id).cloned()
    }
}

trait AuditLog: Send + Sync {
    fn record(&self, entry: String);
    fn entries(&self) -> Vec<String>;
}

#[derive(Default)]
struct MemoryAuditLog {
    entries: Mutex<Vec<String>>,
}

impl AuditLog for MemoryAuditLog {
    fn record(&self, entry: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }

    fn entries(&self) -> Vec<String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

/// Built once per request; sees the request context registered on the child.
struct UserHandler {
    context: Arc<RequestContext>,
    users: Arc<dyn UserRepository>,
    audit: Arc<dyn AuditLog>,
}

static HANDLERS_BUILT: AtomicU64 = AtomicU64::new(0);

impl UserHandler {
    fn new(context: Arc<RequestContext>, users: Arc<dyn UserRepository>, audit: Arc<dyn AuditLog>) -> Self {
        HANDLERS_BUILT.fetch_add(1, Ordering::SeqCst);
        Self { context, users, audit }
    }

    fn handle(&self) -> Result<String, NotFound> {
        let id = self.context.path.trim_start_matches("/users/");
        self.audit
            .record(format!("request {} GET {}", self.context.request_id, self.context.path));
        self.users
            .find_by_id(id)
            .map(|user| format!("200 {} ({})", user.name, user.id))
            .ok_or_else(|| NotFound(id.to_string()))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ferrous_ioc=debug"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}

fn build_root(metrics: Arc<MetricsObserver>) -> Result<Container, Box<dyn std::error::Error>> {
    // PIPELINE_NAME / PIPELINE_DEFAULT_SCOPE override the defaults
    let options = ContainerOptions::from_env("PIPELINE")?;
    let root = Container::builder()
        .options(options)
        .observer(Arc::new(LoggingObserver::with_prefix("pipeline")))
        .observer(metrics)
        .build();

    root.register_with(
        InMemoryUserRepository::new,
        [RegisterOptions::new()
            .lifetime_scope(LifetimeScope::ContainerManaged)
            .interface(Interface::new::<InMemoryUserRepository, dyn UserRepository>(|r| r))],
    )?;
    root.register_with(
        Constant::new(MemoryAuditLog::default()),
        [RegisterOptions::new().interface(Interface::new::<MemoryAuditLog, dyn AuditLog>(|a| a))],
    )?;
    root.verify()?;
    Ok(root)
}

fn serve(root: &Container, request_id: u64, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let request = root.create_child_container();
    request.register(Constant::new(RequestContext {
        request_id,
        path: path.to_string(),
    }))?;
    request.register(UserHandler::new)?;

    let outcome = request.invoke(|handler: Arc<UserHandler>| -> Result<(), NotFound> {
        let response = handler.handle()?;
        println!("  [request {}] {} -> {}", request_id, path, response);
        Ok(())
    });

    if let Err(err) = outcome {
        println!("  [request {}] {} -> 404 {}", request_id, path, err);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    println!("=== Request pipeline ===\n");
    let metrics = Arc::new(MetricsObserver::new());
    let root = build_root(metrics.clone())?;
    println!("  [root] container '{}' verified\n", root.name());

    for (request_id, path) in ["/users/1", "/users/3", "/users/9", "/users/2"].iter().enumerate() {
        serve(&root, request_id as u64 + 1, path)?;
    }

    println!("\n=== Audit log ===");
    root.invoke(|audit: Arc<dyn AuditLog>| {
        for entry in audit.entries() {
            println!("  {}", entry);
        }
    })?;

    println!("\n=== Metrics ===");
    println!("  handlers built:   {}", HANDLERS_BUILT.load(Ordering::SeqCst));
    println!("  resolutions:      {}", metrics.resolution_count());
    println!("  failures:         {}", metrics.failure_count());
    println!("  invocations:      {}", metrics.invocation_count());
    if let Some(avg) = metrics.average_resolution_time() {
        println!("  avg resolution:   {:?}", avg);
    }
    Ok(())
}
