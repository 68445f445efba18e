use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::certify::CertifyRequest;
use crate::core::service;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::ui::messages::{review, success};

/// Certify a pending session; the only way a session closes.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Certify {
        session,
        hours,
        break_count,
        signer,
        attested,
        expect_version,
    } = cmd
    {
        let req = CertifyRequest {
            attested_hours: *hours,
            attested_break_count: *break_count,
            signer_name: signer,
            attested: *attested,
        };

        let mut pool = DbPool::new(&cfg.database)?;
        let result = service::certify(&mut pool, cfg, *session, &req, *expect_version)?;

        success(format!(
            "Session {} certified and closed by {} (attested {:.2} h, computed {:.2} h)",
            result.session.id,
            result.certification.signer_name,
            result.certification.attested_hours,
            result.certification.computed_hours,
        ));

        if result.certification.hours_mismatch {
            review(
                "Attested hours differ from computed hours beyond tolerance; flagged for review.",
            );
        }
    }

    Ok(())
}
