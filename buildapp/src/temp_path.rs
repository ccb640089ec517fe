use std::path::PathBuf;

/// Returns a path in the system temporary directory with a random 16 character file stem and the
/// given extension. The file is not created.
pub fn tmp_path(ext: &str) -> PathBuf {
    use rand::distributions::{Alphanumeric, DistString};

    const LEN: usize = 16;

    let mut name = String::with_capacity(LEN + ext.len());
    Alphanumeric.append_string(&mut rand::thread_rng(), &mut name, LEN);
    name.push_str(ext);
    std::env::temp_dir().join(name)
}
