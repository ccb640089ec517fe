use std::{borrow::Cow, fmt};

use log::Level;

use crate::{
    component::Component,
    engine::{BuildImageError, BuildImageOptions, BuildLogRecord, BuiltImage, Engine},
    log_sink::LogSink,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct BuildOptions {
    pub no_cache: bool,
    pub pull: bool,
}

/// Which components to build. Selected components are always built server first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub server: bool,
    pub client: bool,
}

impl Selection {
    pub const ALL: Selection = Selection {
        server: true,
        client: true,
    };

    pub fn contains(self, component: Component) -> bool {
        match component {
            Component::Server => self.server,
            Component::Client => self.client,
        }
    }

    pub fn components(self) -> impl Iterator<Item = Component> {
        Component::ALL
            .into_iter()
            .filter(move |&component| self.contains(component))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Built { image_id: String },
    Failed,
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub outcomes: Vec<(Component, BuildOutcome)>,
}

impl BuildReport {
    pub fn failed(&self) -> impl Iterator<Item = Component> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == BuildOutcome::Failed)
            .map(|&(component, _)| component)
    }
}

/// Builds the server and client images with a fixed set of tags and writes everything the engine
/// reports to the log sink. A failed build is logged and does not prevent building the other
/// component.
pub struct BuildOrchestrator<E> {
    engine: E,
    server_tag: String,
    client_tag: String,
    options: BuildOptions,
    sink: LogSink,
}

impl<E: Engine> BuildOrchestrator<E> {
    pub fn new(
        engine: E,
        repository: &str,
        tag: Option<&str>,
        options: BuildOptions,
        sink: LogSink,
    ) -> Self {
        Self {
            engine,
            server_tag: Component::Server.image_tag(repository, tag),
            client_tag: Component::Client.image_tag(repository, tag),
            options,
            sink,
        }
    }

    pub fn image_tag(&self, component: Component) -> &str {
        match component {
            Component::Server => &self.server_tag,
            Component::Client => &self.client_tag,
        }
    }

    pub fn build_component(&self, component: Component) -> BuildOutcome {
        let context_dir = component.context_dir();
        self.report(
            Level::Info,
            format_args!("building from Dockerfile at {}...", context_dir.display()),
        );

        let result = self.engine.build_image(BuildImageOptions {
            path: &context_dir,
            tag: self.image_tag(component),
            use_cache: !self.options.no_cache,
            pull: self.options.pull,
            remove_intermediate_containers: true,
        });

        match result {
            Ok(BuiltImage { id, logs }) => {
                self.write_records(&logs);
                self.report(Level::Info, format_args!("created image. ID: {id}"));
                BuildOutcome::Built { image_id: id }
            }
            Err(BuildImageError::Build { message, logs }) => {
                self.write_records(&logs);
                self.report(Level::Error, format_args!("build error: {message}"));
                BuildOutcome::Failed
            }
            Err(BuildImageError::Api { message }) => {
                self.report(Level::Error, format_args!("general api error: {message}"));
                BuildOutcome::Failed
            }
        }
    }

    pub fn build_selected(&self, selection: Selection) -> BuildReport {
        BuildReport {
            outcomes: selection
                .components()
                .map(|component| (component, self.build_component(component)))
                .collect(),
        }
    }

    pub fn build_all(&self) -> BuildReport {
        self.build_selected(Selection::ALL)
    }

    /// Writes every key/value pair of every record as its own line.
    fn write_records(&self, records: &[BuildLogRecord]) {
        for record in records {
            for (key, value) in record {
                self.sink
                    .info(format_args!("{key}: {value}", value = display_value(value)));
            }
        }
    }

    /// Logs to both the console and the log sink.
    fn report(&self, level: Level, args: fmt::Arguments<'_>) {
        log::log!(level, "{args}");
        self.sink.log(level, args);
    }
}

/// Strings are written without the surrounding quotes of their JSON representation.
fn display_value(value: &serde_json::Value) -> Cow<'_, str> {
    match value {
        serde_json::Value::String(value) => Cow::Borrowed(value),
        value => Cow::Owned(value.to_string()),
    }
}
