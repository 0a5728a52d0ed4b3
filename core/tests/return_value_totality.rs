// core/tests/return_value_totality.rs
//
// Every combination of return-value flags is interpreted, and each one
// performs exactly the actions its flags imply:
// - reset clears the composition and resets the backend exactly once
// - commit happens only with a pending commit and a non-empty output buffer
// - forward happens for FORWARD_KEY or for the empty (declined) value
// - fetch happens for UPDATE_CANDIDATE_WORDS unless DISPLAY_LAST is set
// - one redraw at most, of the right kind
//
// Each mask is run against several fetch results, whose reset, commit,
// redraw and mode bits combine with the outer value's.

use imdispatch_core::{
    ContextId, InputContext, InputMethod, InputMethodInfo, InputMethodRegistry, InputState, InputWindow,
    KeyEvent, KeyResult, KeySym, Modifiers, ReturnValue, ReturnValueInterpreter, Transport,
};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Default)]
struct Calls {
    resets: Cell<u32>,
    fetches: Cell<u32>,
    tips: Cell<u32>,
}

struct Counting {
    calls: Rc<Calls>,
    fetch_result: ReturnValue,
}

impl InputMethod for Counting {
    fn reset(&mut self) {
        self.calls.resets.set(self.calls.resets.get() + 1);
    }

    fn handle_key(&mut self, _: KeySym, _: Modifiers, _: &mut InputState) -> ReturnValue {
        ReturnValue::TO_PROCESS
    }

    fn fetch_candidates(&mut self, _: &mut InputState) -> ReturnValue {
        self.calls.fetches.set(self.calls.fetches.get() + 1);
        self.fetch_result
    }

    fn phrase_tips(&mut self, _: &mut InputState) -> bool {
        self.calls.tips.set(self.calls.tips.get() + 1);
        true
    }
}

#[derive(Default)]
struct Recorder {
    commits: Vec<String>,
    forwards: u32,
    redraws: u32,
    last_pages: u32,
}

impl Transport for Recorder {
    fn commit_string(&mut self, _: ContextId, text: &str) {
        self.commits.push(text.to_string());
    }

    fn forward_key(&mut self, _: ContextId, _: KeyEvent) {
        self.forwards += 1;
    }
}

#[derive(Default)]
struct WindowRecorder {
    redraws: u32,
    last_pages: u32,
}

impl InputWindow for WindowRecorder {
    fn update_input_window(&mut self, _: ContextId, _: &InputState) {
        self.redraws += 1;
    }

    fn display_last_page(&mut self, _: ContextId, _: &InputState) {
        self.last_pages += 1;
    }
}

const FETCH_RESULTS: [ReturnValue; 4] = [
    ReturnValue::DO_NOTHING,
    ReturnValue::DISPLAY_CANDWORDS,
    ReturnValue::COMMIT_STRING.union(ReturnValue::RESET_INPUT),
    ReturnValue::RESET_INPUT,
];

fn counting_registry(fetch_result: ReturnValue) -> (Rc<Calls>, InputMethodRegistry, InputContext) {
    let calls = Rc::new(Calls::default());
    let mut registry = InputMethodRegistry::new();
    registry
        .register(
            "counting",
            InputMethodInfo::new("counting", "c", 0).unwrap(),
            Box::new(Counting {
                calls: calls.clone(),
                fetch_result,
            }),
        )
        .unwrap();
    let mut ctx = InputContext::new(ContextId(1));
    registry.switch(&mut ctx, 0, false).unwrap();
    assert!(registry.active_backend(&mut ctx).is_some());
    (calls, registry, ctx)
}

fn run_mask(bits: u16, output: &str, fetch_result: ReturnValue) -> (Rc<Calls>, InputContext, Recorder, KeyResult) {
    let (calls, mut registry, mut ctx) = counting_registry(fetch_result);
    ctx.state.raw_input_mut().set_text(&"n".repeat(bits as usize % 300)).unwrap();
    ctx.state.set_output(output).unwrap();

    let rv = ReturnValue::from_bits(bits).unwrap();
    let event = KeyEvent::press(KeySym::SPACE, Modifiers::empty(), 1);
    let mut transport = Recorder::default();
    let mut window = WindowRecorder::default();
    let result = ReturnValueInterpreter::new(&mut transport, &mut window).apply(&mut registry, &mut ctx, event, rv);
    transport.redraws = window.redraws;
    transport.last_pages = window.last_pages;
    (calls, ctx, transport, result)
}

#[test]
fn test_every_mask_performs_exactly_its_actions() {
    for fetch_result in FETCH_RESULTS {
        for bits in 0..(1u16 << 10) {
            let rv = ReturnValue::from_bits(bits).unwrap();
            let (calls, ctx, rec, result) = run_mask(bits, "ni hao", fetch_result);

            let last = rv.contains(ReturnValue::DISPLAY_LAST);
            let fetch = rv.contains(ReturnValue::UPDATE_CANDIDATE_WORDS) && !last;
            let combined = if fetch { rv | fetch_result } else { rv };
            let reset = combined.contains(ReturnValue::RESET_INPUT);
            let commit = combined.contains(ReturnValue::PENDING_COMMIT_STRING);
            let forward = rv.contains(ReturnValue::FORWARD_KEY) || rv.is_empty();
            let tips = commit && combined.contains(ReturnValue::DO_PHRASE_TIPS);
            let redraw = !last && (combined.contains(ReturnValue::UPDATE_INPUT_WINDOW) || tips);

            let what = format!("{:?} with fetch {:?}", rv, fetch_result);
            assert_eq!(calls.resets.get(), reset as u32, "resets for {what}");
            if reset {
                assert!(ctx.state.raw_input().is_empty(), "raw input after {what}");
                assert_eq!(ctx.state.cursor(), 0);
            }
            assert_eq!(rec.commits.len(), commit as usize, "commits for {what}");
            assert_eq!(ctx.state.output_string().is_empty(), commit, "output after {what}");
            assert_eq!(rec.forwards, forward as u32, "forwards for {what}");
            assert_eq!(calls.fetches.get(), fetch as u32, "fetches for {what}");
            assert_eq!(calls.tips.get(), tips as u32, "tips for {what}");
            assert_eq!(rec.redraws, redraw as u32, "redraws for {what}");
            assert_eq!(rec.last_pages, last as u32, "last-page redraws for {what}");
            assert_eq!(ctx.modes, combined & (ReturnValue::ENG | ReturnValue::PUNC));
            assert_eq!(result == KeyResult::NotHandled, forward);
        }
    }
}

#[test]
fn test_commit_with_empty_output_is_noop_for_every_mask() {
    for fetch_result in FETCH_RESULTS {
        for bits in 0..(1u16 << 10) {
            let (calls, _, rec, _) = run_mask(bits, "", fetch_result);
            assert!(rec.commits.is_empty());
            // No commit means no phrase tips either
            assert_eq!(calls.tips.get(), 0);
        }
    }
}

#[test]
fn test_reset_clears_long_input() {
    for len in [0usize, 1, 150, 300] {
        let (calls, mut registry, mut ctx) = counting_registry(ReturnValue::DO_NOTHING);
        ctx.state.raw_input_mut().set_text(&"x".repeat(len)).unwrap();

        let mut transport = Recorder::default();
        let mut window = WindowRecorder::default();
        ReturnValueInterpreter::new(&mut transport, &mut window).apply(
            &mut registry,
            &mut ctx,
            KeyEvent::press(KeySym::ESCAPE, Modifiers::empty(), 0),
            ReturnValue::CLEAN,
        );
        assert!(ctx.state.raw_input().is_empty());
        assert_eq!(ctx.state.cursor(), 0);
        assert_eq!(calls.resets.get(), 1);
    }
}
