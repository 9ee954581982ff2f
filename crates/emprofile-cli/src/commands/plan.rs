use emprofile_core::{
    ArtifactEncoding, CollectionStrategy, ProfileRequest, StaticProbe, resolve_strategy,
};

pub struct PlanCommandConfig<'a> {
    pub mode: &'a str,
    pub force_legacy: bool,
    pub force_enhanced: bool,
    pub rails_supported: bool,
    pub collector: bool,
    pub config_path: Option<&'a str>,
}

pub fn run(cmd: PlanCommandConfig<'_>) {
    let config = super::load_config(cmd.config_path);
    let mut request = ProfileRequest::from_mode(super::parse_mode(cmd.mode));
    request.force_legacy |= cmd.force_legacy;
    request.force_enhanced |= cmd.force_enhanced;

    let probe = StaticProbe {
        collector: cmd.collector,
        power_rails: cmd.rails_supported,
    };

    match resolve_strategy(request, &probe, &config.artifacts) {
        Ok(strategy) => print!("{}", render_plan(&strategy)),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    }
}

fn render_plan(strategy: &CollectionStrategy) -> String {
    let encoding = match strategy.artifact.encoding {
        ArtifactEncoding::Text => "text (--txt)",
        ArtifactEncoding::Binary => "binary",
    };
    let mut out = String::new();
    out.push_str(&format!("Strategy: {} (mode: {})\n", strategy.kind, strategy.mode_label()));
    out.push_str(&format!("Collector config: {}\n", strategy.artifact.id));
    out.push_str(&format!("Config encoding: {encoding}\n"));
    out.push_str(&format!(
        "Collects: energy={} memory={}\n",
        strategy.kind.collects_energy(),
        strategy.kind.collects_memory()
    ));
    out
}
