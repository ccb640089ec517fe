use std::path::{Path, PathBuf};

pub const SERVER_CONTEXT: &str = "rest-server";
pub const CLIENT_CONTEXT: &str = "react-client";

/// The two images of the application. The build context of each component is a directory with
/// the component's name in the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Server,
    Client,
}

impl Component {
    /// Every component in build order.
    pub const ALL: [Component; 2] = [Component::Server, Component::Client];

    pub const fn name(self) -> &'static str {
        match self {
            Component::Server => SERVER_CONTEXT,
            Component::Client => CLIENT_CONTEXT,
        }
    }

    pub fn context_dir(self) -> PathBuf {
        Path::new(".").join(self.name())
    }

    /// Returns `<repository>/<name>`, suffixed with `:<tag>` when a tag is given.
    pub fn image_tag(self, repository: &str, tag: Option<&str>) -> String {
        let mut image_tag = format!("{repository}/{name}", name = self.name());
        if let Some(tag) = tag {
            image_tag.push(':');
            image_tag.push_str(tag);
        }
        image_tag
    }
}
