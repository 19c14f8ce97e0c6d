/// Bundles the plugin through nih_plug_xtask. Usage:
///
///   cargo xtask bundle room-bleed --release
///
/// Produces `target/bundled/Room Bleed.vst3` and `Room Bleed.clap`.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
