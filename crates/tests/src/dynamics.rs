//! Evaluation.

use crate::check::{interpreter, run};
use analysis::ErrorKind;
use config::Options;
use pretty_assertions::assert_eq;

#[track_caller]
fn val(s: &str, name: &str) -> String {
  run(s).value(name).expect("no such value").to_string()
}

#[test]
fn arithmetic() {
  assert_eq!(val("val x = 7 div 2 + 7 mod 2", "x"), "4");
  assert_eq!(val("val x = ~7 div 2", "x"), "~4");
  assert_eq!(val("val x = 7.0 / 2.0", "x"), "3.5");
  assert_eq!(val("val x = 0w3 + 0w4", "x"), "0wx7");
  assert_eq!(val(r#"val x = "a" ^ "b""#, "x"), r#""ab""#);
  assert_eq!(val("val x = ord #\"a\"", "x"), "97");
}

#[test]
fn comparison() {
  assert_eq!(val("val x = 1 < 2 andalso 2.0 >= 1.5", "x"), "true");
  assert_eq!(val(r#"val x = "b" > "a""#, "x"), "true");
  assert_eq!(val("val x = [1, 2] = [1, 2]", "x"), "true");
  assert_eq!(val("val x = (1, #\"a\") <> (1, #\"b\")", "x"), "true");
}

#[test]
fn handle() {
  assert_eq!(val("exception E of int val x = (raise E 3) handle E n => n + 1", "x"), "4");
  assert_eq!(val("val x = 1 div 0 handle Div => 0", "x"), "0");
  assert_eq!(val("val x = (hd [] handle Overflow => 1) handle Empty => 2", "x"), "2");
}

#[test]
fn uncaught() {
  let mut interpreter = interpreter(Options::default());
  let out = interpreter.run("val x = 1 val _ = raise Fail \"boom\"").unwrap();
  assert!(out.raised.is_some());
  assert_eq!(out.to_string(), "uncaught exception Fail \"boom\"");
  let e = interpreter.run("val y = x").unwrap_err();
  assert_eq!(e.kind(), ErrorKind::Elaboration);
}

#[test]
fn match_and_bind() {
  assert!(run("fun f 0 = 1 val _ = f 2").raised.is_some());
  assert!(run("val SOME x = NONE : int option").raised.is_some());
}

#[test]
fn refs() {
  let out = run("val r = ref 1 val _ = r := !r + 1 val x = !r");
  assert_eq!(out.value("x").unwrap().to_string(), "2");
  let log: Vec<_> = out.mem.iter().map(|(addr, v)| format!("{addr} {v}")).collect();
  assert_eq!(log, ["0 1", "0 2"]);
}

#[test]
fn refs_across_inputs() {
  let mut interpreter = interpreter(Options::default());
  interpreter.run("val r = ref 0").unwrap();
  interpreter.run("val _ = r := 5").unwrap();
  let out = interpreter.run("val x = !r").unwrap();
  assert_eq!(out.value("x").unwrap().to_string(), "5");
  assert_eq!(interpreter.mem().len(), 1);
}

#[test]
fn closures() {
  let out = run(
    r"
fun adder n = fn x => x + n
val add2 = adder 2
val n = 100
val x = add2 1
",
  );
  assert_eq!(out.value("x").unwrap().to_string(), "3");
}

#[test]
fn prelude() {
  let out = run(
    r"
val xs = map (fn x => x * 2) [1, 2, 3]
val n = length xs
val s = foldl op+ 0 xs
val r = rev xs
val ys = xs @ [8]
val f = (fn x => x + 1) o (fn x => x * 3)
val y = f 2
",
  );
  assert_eq!(out.value("xs").unwrap().to_string(), "[2, 4, 6]");
  assert_eq!(out.value("n").unwrap().to_string(), "3");
  assert_eq!(out.value("s").unwrap().to_string(), "12");
  assert_eq!(out.value("r").unwrap().to_string(), "[6, 4, 2]");
  assert_eq!(out.value("ys").unwrap().to_string(), "[2, 4, 6, 8]");
  assert_eq!(out.value("y").unwrap().to_string(), "7");
  assert_eq!(out.ty("xs").unwrap(), "int list");
}

#[test]
fn deep_recursion() {
  let s = "fun count 0 = 0 | count n = 1 + count (n - 1) val x = count 100000";
  assert_eq!(val(s, "x"), "100000");
}

#[test]
fn while_loop() {
  let s = "val i = ref 0 val sum = ref 0
val _ = while !i < 10 do (i := !i + 1; sum := !sum + !i)
val x = !sum";
  assert_eq!(val(s, "x"), "55");
}

#[test]
fn datatypes() {
  let out = run(
    r"
datatype tree = Leaf | Node of tree * int * tree
fun insert (x, Leaf) = Node (Leaf, x, Leaf)
  | insert (x, t as Node (l, y, r)) =
      if x < y then Node (insert (x, l), y, r)
      else if x > y then Node (l, y, insert (x, r))
      else t
fun toList Leaf = []
  | toList (Node (l, x, r)) = toList l @ [x] @ toList r
val xs = toList (foldl insert Leaf [3, 1, 2, 3])
val t = insert (1, Leaf)
",
  );
  assert_eq!(out.value("xs").unwrap().to_string(), "[1, 2, 3]");
  assert_eq!(out.value("t").unwrap().to_string(), "Node (Leaf, 1, Leaf)");
}

#[test]
fn records() {
  let out = run("val r = {b = 2, a = 1} val x = #a r + #b r val {a, ...} = r");
  assert_eq!(out.value("r").unwrap().to_string(), "{a = 1, b = 2}");
  assert_eq!(out.value("x").unwrap().to_string(), "3");
  assert_eq!(out.value("a").unwrap().to_string(), "1");
}

#[test]
fn local_and_abstype() {
  let out = run(
    r"
local val secret = 41 in val answer = secret + 1 end
abstype t = T of int with fun mk n = T n fun get (T n) = n end
val y = get (mk 7)
",
  );
  assert_eq!(out.value("answer").unwrap().to_string(), "42");
  assert!(out.value("secret").is_none());
  assert!(out.value("T").is_none());
  assert_eq!(out.value("y").unwrap().to_string(), "7");
}

#[test]
fn display() {
  let out = run(r#"val x = 1 val y = "a""#);
  assert_eq!(out.to_string(), "val x = 1 : int\nval y = \"a\" : string");
}
