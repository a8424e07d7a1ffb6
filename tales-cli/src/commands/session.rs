//! Session commands - signup, signin, guest, signout

use anyhow::Result;
use tales_core::UserIdentity;

use super::get_context;
use crate::output;

fn report(user: &UserIdentity, verb: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(user)?);
    } else {
        let who = user.email.as_deref().unwrap_or("guest");
        output::success(&format!("{} as {}", verb, who));
    }
    Ok(())
}

pub fn sign_up(email: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user = ctx.sign_up(email)?;
    report(&user, "Signed up", json)
}

pub fn sign_in(email: &str, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user = ctx.sign_in(email)?;
    report(&user, "Signed in", json)
}

pub fn guest(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user = ctx.sign_in_anonymously()?;
    report(&user, "Continuing", json)
}

pub fn sign_out() -> Result<()> {
    let ctx = get_context()?;
    ctx.sign_out()?;
    output::info("Signed out");
    Ok(())
}
