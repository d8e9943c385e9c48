//! Essay Circle Backend - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = essay_circle_backend::run().await {
        eprintln!("fatal: {e}");
        std::process::exit(1);
    }
}
