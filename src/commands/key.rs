use crate::{config::PathRules, storage_key::derive_key};

pub fn print_key(candidate: &str, paths: &PathRules, verbose: bool) {
    if verbose {
        println!("🔑 Base path: {}", paths.base_path);
        println!("  Root path: {}", paths.root_path);
    }
    println!("{}", derive_key(&paths.base_path, &paths.root_path, candidate));
}
