//! Facebook and Instagram OAuth entry points

use super::Suite;
use crate::check::Check;
use crate::step::Step;

/// Platform and a host its authorization URL must point at, when known
const PLATFORMS: &[(&str, Option<&str>)] = &[
    ("facebook", Some("facebook.com")),
    ("instagram", None),
];

pub fn social() -> Suite {
    let mut steps = Vec::new();

    for (platform, host) in PLATFORMS {
        let mut auth_url = Step::get(
            &format!("{} auth url is issued", platform),
            &format!("/social/{}/auth-url", platform),
        )
        .with_check(Check::non_empty("auth_url"));
        if let Some(host) = host {
            auth_url = auth_url.with_check(Check::contains("auth_url", host));
        }
        steps.push(auth_url);

        // A forged state must never be accepted as a connection, whether the
        // backend answers directly or redirects back to the app
        steps.push(
            Step::get(
                &format!("{} callback rejects a forged state", platform),
                &format!("/social/{}/callback?code=cmprobe&state=forged", platform),
            )
            .anonymous()
            .expecting(&[302, 303, 307, 400])
            .with_check(Check::location_excludes("success=true")),
        );
    }

    Suite::new("social", "OAuth URLs and callback handling").with_steps(steps)
}
