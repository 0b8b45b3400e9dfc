use ib_rematch::{Bindings, Engine};

fn main() {
    let mut env = Bindings::new();

    let objs = ib_rematch::substitute(&mut env, r"(\w+)\.c", r"obj/\1.o", "main.c util.c", "g");
    assert_eq!(objs.as_deref(), Some(&b"obj/main.o obj/util.o"[..]));

    let version = ib_rematch::find(
        &mut env,
        r"(?<major>\d+)\.(?<minor>\d+)",
        "VERSION = 2.14",
        "",
    );
    assert_eq!(version.as_deref(), Some(&b"2.14"[..]));
    assert_eq!(env.named("minor"), Some(&b"14"[..]));

    // Patterns can reference host variables with `e`
    env.define("ext", r"\.(c|h)");
    let headers = ib_rematch::find(&mut env, r"\w+$(ext)", "a.c b.h c.rs", "ge");
    assert_eq!(headers.as_deref(), Some(&b"a.c b.h"[..]));

    // Bad options and patterns are reported, not fatal
    let engine = Engine::default();
    assert_eq!(engine.find(&mut env, "a(", "a", "gz"), None);
    for diagnostic in env.take_diagnostics() {
        println!("{diagnostic}");
    }
}
