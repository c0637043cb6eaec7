mod app;
mod assets;
mod renderer;

fn main() -> anyhow::Result<()> {
    app::run()
}
