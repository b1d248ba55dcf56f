fn main() {
    if let Err(error) = pdf_editor_cli::run(std::env::args_os()) {
        log::error!("{error:#}");
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}
