use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum Error {
    /// Not enough candidates were proposed, with respect to navigation parameters.
    #[error("not enough candidates provided")]
    NotEnoughCandidates,
    /// PreFit (signal quality, health, eclipse..) criterias
    /// have been applied but we're left with not enough vehicles: no attempt.
    #[error("not enough candidates match pre-fit criteria")]
    NotEnoughPreFitCandidates,
    /// All measurements of the epoch were rejected: the filter state
    /// is preserved as it was after the time update.
    #[error("no valid observation left for this epoch")]
    NoValidObservation,
    /// Invalid orbital states or bad signal data may cause the algebric
    /// calculations to wind up here. The epoch is abandoned, the committed
    /// state is preserved.
    #[error("failed to invert matrix")]
    MatrixInversion,
    /// The measurement update produced non-finite values: bad signal
    /// data or an ill-conditioned covariance.
    #[error("nav filter converged to physicaly invalid state")]
    StateUpdate,
    /// Each [Candidate] needs a resolved orbital state to contribute.
    #[error("unresolved candidate state")]
    UnresolvedState,
    #[error("unknown or non supported frequency")]
    InvalidFrequency,
    /// A constellation was observed that the session was not configured for.
    #[error("non supported constellation")]
    UnsupportedConstellation,
    /// Session configuration does not form a valid state layout.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
