//! Autoloader walkthrough.
//!
//! Run with `RUST_LOG=autoloader=debug cargo run --example autoload_demo`
//! to see every candidate the loader considers.

use std::path::PathBuf;
use std::sync::Arc;

use autoloader::{Autoloader, ClassSpace, DeclarationLoader};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let demo_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos");
    let lib = demo_dir.join("lib");
    let inc = demo_dir.join("inc");

    let loader = Autoloader::get_ready(None);
    let space = Arc::new(ClassSpace::new(Arc::clone(loader.chain())));
    loader
        .set_file_loader(Arc::new(DeclarationLoader::new(&space)))
        .add_path(lib.display().to_string())
        .add_extension(".class.php");
    loader.enable();

    println!("paths:      {:?}", Autoloader::get_ready(None).paths());
    println!("extensions: {:?}", Autoloader::get_ready(None).extensions());
    println!("loaded:     {:?}", Autoloader::get_ready(None).loaded());
    println!("Foo loaded? {}", Autoloader::get_ready(None).is_loaded("Foo"));

    match space.require("Foo") {
        Ok(()) => println!("Foo resolved"),
        Err(err) => println!("Foo failed: {}", err),
    }
    println!("Foo loaded? {}", Autoloader::get_ready(None).is_loaded("Foo"));
    println!("loaded:     {:?}", Autoloader::get_ready(None).loaded());

    // Add a second location, then stop autoloading.
    let loader = Autoloader::get_ready(None);
    loader.add_path(inc.display().to_string()).add_extension(".inc");
    loader.disable();

    match space.require("Bar") {
        Ok(()) => println!("Bar resolved while disabled (unexpected)"),
        Err(err) => println!("Bar while disabled: {}", err),
    }

    loader.enable();
    match space.require("Bar") {
        Ok(()) => println!("Bar resolved from {:?}", loader.loaded_path("Bar")),
        Err(err) => println!("Bar failed: {}", err),
    }
}
