/// Maps a candidate file name to its object key.
///
/// Any `//<candidate>` suffix and every occurrence of `root_path` are removed
/// from `base_path`, the candidate is appended, and backslashes become
/// forward slashes. An empty `root_path` strips nothing.
pub fn derive_key(base_path: &str, root_path: &str, candidate: &str) -> String {
    let mut prefix = base_path.replace(&format!("//{}", candidate), "");
    if !root_path.is_empty() {
        prefix = prefix.replace(root_path, "");
    }
    prefix.push_str(candidate);
    prefix.replace('\\', "/")
}
