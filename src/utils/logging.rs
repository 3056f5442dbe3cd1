use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive enabling this crate's own events at `level`
fn crate_directive(level: &str) -> String {
    format!("{}={}", env!("CARGO_CRATE_NAME"), level)
}

/// Initialize the logging system
pub fn init_logging(verbose: bool, log_file: Option<PathBuf>) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(crate_directive(level).parse()?)
        .add_directive("warn".parse()?);

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    if let Some(log_file) = log_file {
        if let Some(parent) = log_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = fs::File::create(log_file)?;
        let file_layer = fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(file);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(file_layer)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// Subscriber that records events so tests can assert on log output
#[cfg(test)]
pub mod testing {
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    #[derive(Debug, Clone)]
    pub struct LoggedEvent {
        pub level: Level,
        pub message: String,
        pub fields: Vec<(String, String)>,
    }

    impl LoggedEvent {
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value.as_str())
        }
    }

    #[derive(Clone, Default)]
    pub struct LogRecorder {
        events: Arc<Mutex<Vec<LoggedEvent>>>,
    }

    impl LogRecorder {
        /// Route events on the current thread to this recorder until the guard drops
        pub fn install(&self) -> tracing::subscriber::DefaultGuard {
            let subscriber = tracing_subscriber::registry().with(self.clone());
            tracing::subscriber::set_default(subscriber)
        }

        pub fn events(&self) -> Vec<LoggedEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn at_level(&self, level: Level) -> Vec<LoggedEvent> {
            self.events()
                .into_iter()
                .filter(|event| event.level == level)
                .collect()
        }
    }

    struct EventVisitor<'a>(&'a mut LoggedEvent);

    impl Visit for EventVisitor<'_> {
        fn record_str(&mut self, field: &Field, value: &str) {
            if field.name() == "message" {
                self.0.message = value.to_string();
            } else {
                self.0
                    .fields
                    .push((field.name().to_string(), value.to_string()));
            }
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            let value = format!("{:?}", value);
            if field.name() == "message" {
                self.0.message = value;
            } else {
                self.0.fields.push((field.name().to_string(), value));
            }
        }
    }

    impl<S: Subscriber> Layer<S> for LogRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut logged = LoggedEvent {
                level: *event.metadata().level(),
                message: String::new(),
                fields: Vec::new(),
            };
            event.record(&mut EventVisitor(&mut logged));
            self.events.lock().unwrap().push(logged);
        }
    }
}
