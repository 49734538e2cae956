use office_scene::config::OfficeConfig;

fn main() -> anyhow::Result<()> {
    office_scene::flow::run(OfficeConfig::default())
}
