//! Tests against the installed JavaScript engine
//!
//! Each test returns early when no engine can be found. Set `JSRELAY_RUNTIME` to
//! pick a specific one.

#[macro_use]
mod common;

use jsrelay::{RuntimeErrorKind, Source, Value};

fn pair(a: i64, b: i64) -> Value {
    Value::object([("a", Value::Integer(a)), ("b", Value::Integer(b))])
}

mod exec {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exec_without_value_is_null() {
        let runtime = require_runtime!();
        assert_eq!(runtime.exec("1").unwrap(), Value::Null);
        assert_eq!(runtime.exec("return").unwrap(), Value::Null);
        assert_eq!(runtime.exec("return null").unwrap(), Value::Null);
        assert_eq!(runtime.exec("return function() {}").unwrap(), Value::Null);
    }

    #[test]
    fn test_exec_literals() {
        let runtime = require_runtime!();
        assert_eq!(runtime.exec("return 0").unwrap(), Value::Integer(0));
        assert_eq!(runtime.exec("return true").unwrap(), Value::Boolean(true));
        assert_eq!(runtime.exec("return [1, 2]").unwrap(), Value::from(vec![1i64, 2]));
        assert_eq!(runtime.exec("return 'hello'").unwrap(), Value::from("hello"));
        assert_eq!(runtime.exec("return {a:1,b:2}").unwrap(), pair(1, 2));
        assert_eq!(runtime.exec("return 1.5").unwrap(), Value::Float(1.5));
    }

    #[test]
    fn test_exec_unicode() {
        let runtime = require_runtime!();
        assert_eq!(runtime.exec("return 'café'").unwrap(), Value::from("café"));
        assert_eq!(runtime.exec(r#"return "☃""#).unwrap(), Value::from("☃"));
        assert_eq!(runtime.exec(r#"return "\u2603""#).unwrap(), Value::from("☃"));
        assert_eq!(runtime.exec(r#"return "\\""#).unwrap(), Value::from("\\"));
        assert_eq!(runtime.exec("return '😀'").unwrap(), Value::from("😀"));
    }

    #[test]
    fn test_output_after_result_is_ignored() {
        let runtime = require_runtime!();
        let source = "setTimeout(function() { console.log('late') }, 0); return 42";
        assert_eq!(runtime.exec(source).unwrap(), Value::Integer(42));
        let source = "console.log('[\"ok\",1]'); return 2";
        assert_eq!(runtime.exec(source).unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_exec_large_script() {
        let runtime = require_runtime!();
        let body = "var foo = 'bar';\n".repeat(100_000);
        let source = format!("function foo() {{\n{}\n}};\nreturn true", body);
        assert_eq!(runtime.exec(source).unwrap(), Value::Boolean(true));
    }
}

mod eval {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_eval_without_value_is_null() {
        let runtime = require_runtime!();
        assert_eq!(runtime.eval("").unwrap(), Value::Null);
        assert_eq!(runtime.eval(" ").unwrap(), Value::Null);
        assert_eq!(runtime.eval("null").unwrap(), Value::Null);
        assert_eq!(runtime.eval("function() {}").unwrap(), Value::Null);
    }

    #[test]
    fn test_eval_literals() {
        let runtime = require_runtime!();
        assert_eq!(runtime.eval("0").unwrap(), Value::Integer(0));
        assert_eq!(runtime.eval("true").unwrap(), Value::Boolean(true));
        assert_eq!(runtime.eval("[1, 2]").unwrap(), Value::from(vec![1i64, 2]));
        assert_eq!(
            runtime.eval("[1, function() {}]").unwrap(),
            Value::Array(vec![Value::Integer(1), Value::Null])
        );
        assert_eq!(runtime.eval("'hello'").unwrap(), Value::from("hello"));
        assert_eq!(runtime.eval("{a:1,b:2}").unwrap(), pair(1, 2));
        assert_eq!(
            runtime.eval("{a:true,b:function (){}}").unwrap(),
            Value::object([("a", Value::Boolean(true))])
        );
    }

    #[test]
    fn test_eval_unicode() {
        let runtime = require_runtime!();
        assert_eq!(runtime.eval("'café'").unwrap(), Value::from("café"));
        assert_eq!(runtime.eval(r#""☃""#).unwrap(), Value::from("☃"));
        assert_eq!(runtime.eval(r#""\u2603""#).unwrap(), Value::from("☃"));
        assert_eq!(runtime.eval(r#""\\""#).unwrap(), Value::from("\\"));
    }

    #[test]
    fn test_this_is_global_scope() {
        let runtime = require_runtime!();
        assert_eq!(
            runtime.eval("this === (function() {return this})()").unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            runtime.exec("return this === (function() {return this})()").unwrap(),
            Value::Boolean(true)
        );
    }
}

mod encoding {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_declared_encodings() {
        let runtime = require_runtime!();
        let ascii = Source::with_label(&b"'hello'"[..], "us-ascii").unwrap();
        assert_eq!(runtime.eval(ascii).unwrap(), Value::from("hello"));

        let err = runtime.eval(Source::binary(&b"\xde\xad\xbe\xef"[..])).unwrap_err();
        assert_eq!(err.kind(), Some(RuntimeErrorKind::Encoding));
    }

    #[test]
    fn test_encoded_prelude() {
        let runtime = require_runtime!();
        let latin9 = b"foo = function(v) { return '\xb6' + v; }";
        let latin9 = Source::with_label(&latin9[..], "iso-8859-15").unwrap();
        let ctx = runtime.compile(latin9).unwrap();

        assert_eq!(ctx.exec("return foo('hello')").unwrap(), Value::from("¶hello"));
        assert_eq!(ctx.eval("foo('☃')").unwrap(), Value::from("¶☃"));
        let ascii = Source::with_label(&b"foo('hello')"[..], "us-ascii").unwrap();
        assert_eq!(ctx.eval(ascii).unwrap(), Value::from("¶hello"));

        let err = ctx.eval(Source::binary(&b"\xde\xad\xbe\xef"[..])).unwrap_err();
        assert_eq!(err.kind(), Some(RuntimeErrorKind::Encoding));
    }
}

mod compile {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compile() {
        let runtime = require_runtime!();
        let ctx = runtime.compile("foo = function() { return \"bar\"; }").unwrap();
        assert_eq!(ctx.exec("return foo()").unwrap(), Value::from("bar"));
        assert_eq!(ctx.eval("foo()").unwrap(), Value::from("bar"));
        assert_eq!(ctx.call("foo", &[]).unwrap(), Value::from("bar"));
    }

    #[test]
    fn test_call_with_arguments() {
        let runtime = require_runtime!();
        let ctx = runtime
            .compile("function join(sep) { return [].slice.call(arguments, 1).join(sep) }")
            .unwrap();
        let args = [Value::from("-"), Value::from("a"), Value::Integer(1), Value::from("é")];
        assert_eq!(ctx.call("join", &args).unwrap(), Value::from("a-1-é"));
        assert_eq!(
            ctx.call("JSON.stringify", &[Value::from(vec![1i64, 2])]).unwrap(),
            Value::from("[1,2]")
        );
    }

    #[test]
    fn test_call_undefined_function() {
        let runtime = require_runtime!();
        let ctx = runtime.compile("var notAFunction = 1;").unwrap();
        let err = ctx.call("notAFunction", &[]).unwrap_err();
        assert_eq!(err.kind(), Some(RuntimeErrorKind::UndefinedFunction));
        let err = ctx.call("neverDefined", &[]).unwrap_err();
        assert_eq!(err.kind(), Some(RuntimeErrorKind::UndefinedFunction));
    }

    #[test]
    fn test_compile_async() {
        let runtime = match common::async_runtime() {
            Some(runtime) => runtime,
            None => return,
        };
        let ctx = runtime.compile_async("foo = function() { callback('bar') }").unwrap();
        assert_eq!(ctx.call("foo", &[]).unwrap(), Value::from("bar"));
        assert_eq!(ctx.eval("foo()").unwrap(), Value::from("bar"));
        assert_eq!(ctx.exec("return foo()").unwrap(), Value::from("bar"));
    }

    #[test]
    fn test_compile_async_waits_for_timers() {
        let runtime = match common::async_runtime() {
            Some(runtime) => runtime,
            None => return,
        };
        let ctx = runtime
            .compile_async(concat!(
                "later = function(v) { ",
                "setTimeout(function() { callback(v); callback('again'); }, 10) }"
            ))
            .unwrap();
        assert_eq!(ctx.call("later", &[Value::Integer(7)]).unwrap(), Value::Integer(7));
    }
}

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_syntax_error() {
        let runtime = require_runtime!();
        let err = runtime.exec(")").unwrap_err();
        assert!(err.is_runtime_error());
        assert_eq!(err.kind(), Some(RuntimeErrorKind::Syntax));
    }

    #[test]
    fn test_thrown_exception() {
        let runtime = require_runtime!();
        let err = runtime.exec("throw 'hello'").unwrap_err();
        assert!(err.is_program_error());
        assert_eq!(err.message(), "hello");
    }

    #[test]
    fn test_thrown_error_keeps_stack() {
        let runtime = require_runtime!();
        let err = runtime
            .exec("function boom() { throw new TypeError('bad') }\nboom()")
            .unwrap_err();
        assert!(err.is_program_error());
        assert_eq!(err.message(), "TypeError: bad");
        assert!(err.stack_trace().text.contains("boom"));
    }

    #[test]
    fn test_unserializable_result() {
        let runtime = require_runtime!();
        let err = runtime.exec("var a = {}; a.self = a; return a").unwrap_err();
        assert!(err.is_program_error());
    }
}

mod module_input {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prelude_assignments_create_globals() {
        let Some(runtime) = common::module_runtime() else { return };
        let ctx = runtime.compile("foo = function() { return 'bar' }").unwrap();
        assert_eq!(ctx.call("foo", &[]).unwrap(), Value::from("bar"));
        assert_eq!(ctx.eval("foo()").unwrap(), Value::from("bar"));
    }

    #[test]
    fn test_this_is_global_scope() {
        let Some(runtime) = common::module_runtime() else { return };
        assert_eq!(
            runtime.eval("this === (function() {return this})()").unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_errors_and_callbacks() {
        let Some(runtime) = common::module_runtime() else { return };
        assert_eq!(runtime.exec(")").unwrap_err().kind(), Some(RuntimeErrorKind::Syntax));
        assert_eq!(runtime.exec("throw 'hello'").unwrap_err().message(), "hello");
        let ctx = runtime.compile_async("foo = function() { callback('café') }").unwrap();
        assert_eq!(ctx.call("foo", &[]).unwrap(), Value::from("café"));
    }
}
