/// How a participant responded to an interaction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Handling {
    /// Not interested; its return value is ignored.
    #[default]
    PassThrough,
    Handled,
    /// Skip the structure itself, later behaviors still run.
    PreventDefault,
    /// Stop the walk immediately.
    PreventSubsequent,
}

/// A block-side participant that can react to a player starting to interact.
pub trait InteractForward<C: ?Sized> {
    /// Return whether the interaction is allowed. The value only counts if
    /// `handling` is changed from `PassThrough`.
    fn on_interact_start(&mut self, _ctx: &mut C, _handling: &mut Handling) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractOutcome {
    pub allowed: bool,
    /// Handling of the last participant that did not pass through.
    pub handling: Handling,
}

/// Offer an interaction to every attached behavior, then to the structure.
///
/// If nobody handles it, `default` decides.
pub fn forward_interaction<C: ?Sized>(
    behaviors: &mut [&mut dyn InteractForward<C>],
    structure: Option<&mut dyn InteractForward<C>>,
    ctx: &mut C,
    default: impl FnOnce(&mut C) -> bool,
) -> InteractOutcome {
    let mut allowed = true;
    let mut handling = Handling::PassThrough;

    walk(behaviors, structure, ctx, &mut allowed, &mut handling);

    if handling == Handling::PassThrough {
        allowed = default(ctx);
    }
    InteractOutcome { allowed, handling }
}

fn walk<C: ?Sized>(
    behaviors: &mut [&mut dyn InteractForward<C>],
    structure: Option<&mut dyn InteractForward<C>>,
    ctx: &mut C,
    allowed: &mut bool,
    handling: &mut Handling,
) {
    for behavior in behaviors.iter_mut() {
        if offer(&mut **behavior, ctx, allowed, handling) == Handling::PreventSubsequent {
            return;
        }
    }
    if *handling == Handling::PreventDefault {
        return;
    }
    if let Some(structure) = structure {
        offer(structure, ctx, allowed, handling);
    }
}

fn offer<C: ?Sized>(
    participant: &mut dyn InteractForward<C>,
    ctx: &mut C,
    allowed: &mut bool,
    handling: &mut Handling,
) -> Handling {
    let mut local = Handling::PassThrough;
    let result = participant.on_interact_start(ctx, &mut local);
    if local != Handling::PassThrough {
        *allowed = result;
        *handling = local;
    }
    local
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        name: &'static str,
        handling: Handling,
        result: bool,
    }

    impl Scripted {
        fn new(name: &'static str, handling: Handling, result: bool) -> Self {
            Self { name, handling, result }
        }
    }

    impl InteractForward<Vec<&'static str>> for Scripted {
        fn on_interact_start(&mut self, calls: &mut Vec<&'static str>, handling: &mut Handling) -> bool {
            calls.push(self.name);
            *handling = self.handling;
            self.result
        }
    }

    struct Silent;

    impl InteractForward<Vec<&'static str>> for Silent {}

    fn run(
        behaviors: &mut [Scripted],
        structure: &mut Scripted,
        default: bool,
    ) -> (InteractOutcome, Vec<&'static str>) {
        let mut calls = Vec::new();
        let mut refs: Vec<&mut dyn InteractForward<Vec<&'static str>>> = behaviors
            .iter_mut()
            .map(|b| b as &mut dyn InteractForward<Vec<&'static str>>)
            .collect();
        let outcome = forward_interaction(refs.as_mut_slice(), Some(structure), &mut calls, |calls| {
            calls.push("default");
            default
        });
        (outcome, calls)
    }

    #[test]
    fn test_unhandled_falls_back_to_default() {
        let mut behaviors = [Scripted::new("a", Handling::PassThrough, false)];
        let mut structure = Scripted::new("structure", Handling::PassThrough, false);

        let (outcome, calls) = run(&mut behaviors, &mut structure, true);
        assert_eq!(calls, vec!["a", "structure", "default"]);
        assert_eq!(outcome, InteractOutcome { allowed: true, handling: Handling::PassThrough });
    }

    #[test]
    fn test_structure_handles() {
        let mut behaviors = [Scripted::new("a", Handling::PassThrough, false)];
        let mut structure = Scripted::new("structure", Handling::Handled, true);

        let (outcome, calls) = run(&mut behaviors, &mut structure, false);
        assert_eq!(calls, vec!["a", "structure"]);
        assert!(outcome.allowed);
        assert_eq!(outcome.handling, Handling::Handled);
    }

    #[test]
    fn test_prevent_subsequent_stops_walk() {
        let mut behaviors = [
            Scripted::new("a", Handling::PreventSubsequent, false),
            Scripted::new("b", Handling::Handled, true),
        ];
        let mut structure = Scripted::new("structure", Handling::Handled, true);

        let (outcome, calls) = run(&mut behaviors, &mut structure, true);
        assert_eq!(calls, vec!["a"]);
        assert!(!outcome.allowed);
    }

    #[test]
    fn test_prevent_default_skips_structure_only() {
        let mut behaviors = [
            Scripted::new("a", Handling::PreventDefault, false),
            Scripted::new("b", Handling::PassThrough, true),
        ];
        let mut structure = Scripted::new("structure", Handling::Handled, true);

        let (outcome, calls) = run(&mut behaviors, &mut structure, true);
        assert_eq!(calls, vec!["a", "b"]);
        assert_eq!(outcome, InteractOutcome { allowed: false, handling: Handling::PreventDefault });
    }

    #[test]
    fn test_later_handler_overrides_result() {
        let mut behaviors = [
            Scripted::new("a", Handling::Handled, false),
            Scripted::new("b", Handling::Handled, true),
        ];
        let mut structure = Scripted::new("structure", Handling::PassThrough, false);

        let (outcome, _) = run(&mut behaviors, &mut structure, false);
        assert!(outcome.allowed);
    }

    #[test]
    fn test_default_method_passes_through() {
        let mut calls: Vec<&'static str> = Vec::new();
        let mut silent = Silent;
        let outcome = forward_interaction::<Vec<&'static str>>(&mut [], Some(&mut silent), &mut calls, |_| false);
        assert_eq!(outcome, InteractOutcome { allowed: false, handling: Handling::PassThrough });
    }
}
