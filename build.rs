use vergen::{vergen, Config};

fn main() -> anyhow::Result<()> {
    // Exposes VERGEN_BUILD_TIMESTAMP for the startup banner and the info endpoint
    vergen(Config::default())
}
