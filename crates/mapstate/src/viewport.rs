use boundaries::bbox::state_bounds;
use boundaries::collection::BoundaryCollection;
use datasets::selection::{CONTINENTAL_CENTER, DEFAULT_ZOOM};
use engine::surface::{CameraTarget, EngineError, FitOptions, MapSurface};
use foundation::bounds::LngLatBounds;
use foundation::states::state_fips_for_abbr;

pub const FIT_PADDING_PX: u32 = 48;
pub const FIT_MAX_ZOOM: f64 = 8.0;

/// What a fit request resolved to. The no-op variants exist so callers can
/// log why nothing moved.
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    FlewToDefault,
    Fitted(LngLatBounds),
    UnknownRegion,
    GeometryNotLoaded,
    NoMatches,
    DegenerateBounds,
    /// No live engine instance (unmounted or torn down).
    EngineUnavailable,
}

/// Moves the viewport to match a state filter.
///
/// `None` flies back to the continental default. A filter resolves through
/// the static abbreviation table, then to the bounding box of the matching
/// boundary features; every unresolvable step is a deliberate no-op rather
/// than an error, because filters can legitimately outrun geometry loading.
pub fn fit_to_state_filter<E: MapSurface>(
    engine: &mut E,
    collection: Option<&BoundaryCollection>,
    filter: Option<&str>,
) -> Result<FitOutcome, EngineError> {
    let Some(abbr) = filter else {
        engine.fly_to(CameraTarget {
            center: CONTINENTAL_CENTER,
            zoom: DEFAULT_ZOOM,
        })?;
        return Ok(FitOutcome::FlewToDefault);
    };

    let Some(state_fips) = state_fips_for_abbr(abbr) else {
        return Ok(FitOutcome::UnknownRegion);
    };
    let Some(collection) = collection else {
        return Ok(FitOutcome::GeometryNotLoaded);
    };
    let Some(bounds) = state_bounds(collection, state_fips) else {
        return Ok(FitOutcome::NoMatches);
    };
    if bounds.is_degenerate() {
        return Ok(FitOutcome::DegenerateBounds);
    }

    engine.fit_bounds(
        bounds,
        FitOptions {
            padding_px: FIT_PADDING_PX,
            max_zoom: FIT_MAX_ZOOM,
        },
    )?;
    Ok(FitOutcome::Fitted(bounds))
}
