fn main() {
    warpage_pipeline::cli::run();
}
