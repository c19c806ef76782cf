use anyhow::Result;
use monodeploy_core::configs::scenario::scenario_json_schema;

pub fn execute() -> Result<()> {
    println!("{}", scenario_json_schema()?);
    Ok(())
}
