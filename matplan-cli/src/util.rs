use anyhow::{Context, Result, bail};
use matplan_core::constants::SKILL_TRACK_COUNT;
use matplan_core::{QuickAction, RawResourceId, SkillTrack};
use regex::Regex;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse `current:target` (or `current-target`); a lone number means no change.
pub fn parse_range(token: &str) -> Result<(u32, u32)> {
    let range = Regex::new(r"^\s*(\d+)\s*(?:[:\-]\s*(\d+))?\s*$")
        .context("compiling range pattern")?;
    let Some(caps) = range.captures(token) else {
        bail!("expected `current:target`, got `{token}`");
    };
    let current: u32 = caps[1]
        .parse()
        .with_context(|| format!("invalid current value in `{token}`"))?;
    let target = match caps.get(2) {
        Some(m) => m
            .as_str()
            .parse()
            .with_context(|| format!("invalid target value in `{token}`"))?,
        None => current,
    };
    Ok((current, target))
}

/// Parse a narrow range, rejecting values that do not fit in a `u8`.
pub fn parse_small_range(token: &str) -> Result<(u8, u8)> {
    let (current, target) = parse_range(token)?;
    let current = u8::try_from(current).with_context(|| format!("`{token}` is out of range"))?;
    let target = u8::try_from(target).with_context(|| format!("`{token}` is out of range"))?;
    Ok((current, target))
}

/// Parse up to three comma-separated skill ranges; missing tracks stay at 1:1.
pub fn parse_skill_tracks(s: &str) -> Result<[SkillTrack; SKILL_TRACK_COUNT]> {
    let tokens = split_csv(s);
    if tokens.len() > SKILL_TRACK_COUNT {
        bail!(
            "expected at most {SKILL_TRACK_COUNT} skill ranges, got {}",
            tokens.len()
        );
    }
    let mut tracks = [SkillTrack::default(); SKILL_TRACK_COUNT];
    for (slot, token) in tracks.iter_mut().zip(&tokens) {
        let (current, target) = parse_small_range(token)?;
        *slot = SkillTrack::new(current, target);
    }
    Ok(tracks)
}

pub fn parse_resource_id(token: &str) -> Result<RawResourceId> {
    token
        .trim()
        .parse()
        .with_context(|| format!("unknown resource id `{}`", token.trim()))
}

/// Parse `key=quantity`; negative quantities are passed through for the ledger to clamp.
pub fn parse_assignment(token: &str) -> Result<(RawResourceId, i64)> {
    let Some((key, value)) = token.split_once('=') else {
        bail!("expected `key=quantity`, got `{token}`");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("missing resource id in `{token}`");
    }
    let quantity = value
        .trim()
        .parse::<i64>()
        .with_context(|| format!("invalid quantity in `{token}`"))?;
    Ok((parse_resource_id(key)?, quantity))
}

/// Parse `key:action` where action is one of add1, add10, add100, sub1, zero.
pub fn parse_quick_action(token: &str) -> Result<(RawResourceId, QuickAction)> {
    let Some((key, action)) = token.rsplit_once(':') else {
        bail!("expected `key:action`, got `{token}`");
    };
    let action = match action.trim().to_ascii_lowercase().as_str() {
        "add1" | "+1" => QuickAction::Add1,
        "add10" | "+10" => QuickAction::Add10,
        "add100" | "+100" => QuickAction::Add100,
        "sub1" | "subtract1" | "-1" => QuickAction::Subtract1,
        "zero" | "setzero" | "0" => QuickAction::SetZero,
        other => bail!("unknown quick action `{other}`"),
    };
    Ok((parse_resource_id(key)?, action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn parse_range_accepts_both_separators() {
        assert_eq!(parse_range("1:90").unwrap(), (1, 90));
        assert_eq!(parse_range(" 4 - 10 ").unwrap(), (4, 10));
        assert_eq!(parse_range("7").unwrap(), (7, 7));
        assert!(parse_range("one:two").is_err());
        assert!(parse_range("1:2:3").is_err());
    }

    #[test]
    fn parse_small_range_rejects_overflow() {
        assert_eq!(parse_small_range("0:4").unwrap(), (0, 4));
        assert!(parse_small_range("1:300").is_err());
    }

    #[test]
    fn parse_skill_tracks_fills_missing_tracks() {
        let tracks = parse_skill_tracks("1:10, 4:9").unwrap();
        assert_eq!(tracks[0], SkillTrack::new(1, 10));
        assert_eq!(tracks[1], SkillTrack::new(4, 9));
        assert_eq!(tracks[2], SkillTrack::default());
        assert!(parse_skill_tracks("1:2,1:2,1:2,1:2").is_err());
    }

    #[test]
    fn parse_assignment_and_actions() {
        let (id, quantity) = parse_assignment("skill-6503=12").unwrap();
        assert_eq!((id.ledger_key(), quantity), ("6503".to_string(), 12));
        assert_eq!(
            parse_assignment("qp = -4").unwrap(),
            (RawResourceId::Currency, -4)
        );
        assert!(parse_assignment("=3").is_err());
        assert!(parse_assignment("6503").is_err());
        assert!(parse_assignment("mystery=3").is_err());

        assert_eq!(
            parse_quick_action("ember-gold:add10").unwrap().1,
            QuickAction::Add10
        );
        assert_eq!(
            parse_quick_action("6503:zero").unwrap().1,
            QuickAction::SetZero
        );
        assert!(parse_quick_action("6503:double").is_err());
    }
}
