//! Renders the well-known service discovery document a registry would serve under
//! `/.well-known/terraform.json`.

// crates.io
use color_eyre::Result;
// self
use registry_auth::discovery::ServiceDiscovery;

fn main() -> Result<()> {
	color_eyre::install()?;

	let discovery = ServiceDiscovery::default();

	println!("login prefix:    {}", discovery.login_endpoint);
	println!("module prefix:   {}", discovery.module_endpoint);
	println!("provider prefix: {}", discovery.provider_endpoint);
	println!();
	println!("{}", serde_json::to_string_pretty(&discovery.document())?);

	Ok(())
}
