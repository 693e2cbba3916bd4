use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/shapes.svg".to_string());

    let doc = match svgscene::SvgLoader::new().try_load_path(&path) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    };

    let size = doc.size();
    println!("{path}: {}x{}", size.w, size.h);
    if let Some(title) = doc.title() {
        println!("title: {title}");
    }
    println!("{}", doc.outline());

    let mut surface = svgscene::RecordingSurface::new();
    match doc.render(&mut surface, &svgscene::RenderOptions::default()) {
        Ok(()) => {
            println!("{} commands, {} draws", surface.commands().len(), surface.draws().count());
            for name in surface.names() {
                println!("  {name}");
            }
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}
