mod app;

fn main() {
    app::bootstrap::run();
}
