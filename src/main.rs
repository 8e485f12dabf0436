fn main() {
    target_preview_lib::run()
}
