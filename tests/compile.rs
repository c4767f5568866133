mod common;

use common::{returns, run, run_main};
use mipscc::{
    codegen::CodegenError,
    error::CompileError,
    lex::LexerError,
    parse::{ParserError, MAX_NESTING},
};

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(returns("int x = 2 + 3 * 4; return x;"), 14);
    assert_eq!(returns("return (2 + 3) * 4;"), 20);
    assert_eq!(returns("return 10 - 4 - 3;"), 3);
    assert_eq!(returns("return 100 / 10 / 5;"), 2);
}

#[test]
fn comparisons_yield_zero_or_one() {
    let cases = [
        ("<", [1, 0, 0]),
        ("<=", [1, 0, 1]),
        (">", [0, 1, 0]),
        (">=", [0, 1, 1]),
        ("==", [0, 0, 1]),
        ("!=", [1, 1, 0]),
    ];

    for (op, expected) in cases {
        let pairs = [(5, 10), (10, 5), (7, 7)];
        for ((a, b), expected) in pairs.into_iter().zip(expected) {
            let body = format!("int a = {}; int b = {}; return a {} b;", a, b, op);
            assert_eq!(returns(&body), expected, "{} {} {}", a, op, b);
        }
    }
}

#[test]
fn comparisons_with_negative_operands() {
    assert_eq!(returns("return -3 < 2;"), 1);
    assert_eq!(returns("return 2 <= -3;"), 0);
    assert_eq!(returns("return -1 != 1;"), 1);
}

#[test]
fn equality_holds_when_the_difference_overflows() {
    assert_eq!(returns("return 2147483647 != -1;"), 1);
    assert_eq!(returns("return 2147483647 == -1;"), 0);
    assert_eq!(returns("int a = -2147483647 - 1; return a != 1;"), 1);
    assert_eq!(returns("int a = -2147483647 - 1; return a == 1;"), 0);
    assert_eq!(returns("int a = -2147483647 - 1; return a == a;"), 1);
}

#[test]
fn division_truncates_toward_zero() {
    assert_eq!(returns("return 7 / 2;"), 3);
    assert_eq!(returns("return 7 % 2;"), 1);
    assert_eq!(returns("return -7 / 2;"), -3);
    assert_eq!(returns("return -7 % 2;"), -1);
    assert_eq!(returns("return -(2 - 5);"), 3);
    assert_eq!(returns("return +4;"), 4);
}

#[test]
fn else_binds_to_inner_if() {
    assert_eq!(returns("if (1) if (0) return 1; else return 2; return 3;"), 2);
    assert_eq!(returns("if (0) if (1) return 1; else return 2; return 3;"), 3);
}

#[test]
fn while_loop_counts() {
    let run = run_main("int i = 0; while (i < 3) { print_int(i); i = i + 1; } return i;");
    assert_eq!(run.output, "012");
    assert_eq!(run.exit_code, 3);
}

#[test]
fn for_loop_sums() {
    let body = "int i, sum = 0; for (i = 1; i <= 10; i = i + 1) sum = sum + i; return sum;";
    assert_eq!(returns(body), 55);
}

#[test]
fn infinite_for_needs_explicit_return() {
    let body = "int n = 0; for (;;) { n = n + 1; if (n == 5) return n * 2; }";
    assert_eq!(returns(body), 10);
}

#[test]
fn nested_loops() {
    let body = "
        int i, j, count = 0;
        for (i = 0; i < 4; i = i + 1)
            for (j = 0; j < i; j = j + 1)
                count = count + 1;
        return count;
    ";

    assert_eq!(returns(body), 6);
}

#[test]
fn assignment_is_an_expression() {
    assert_eq!(returns("int a, b; a = b = 4; return a + b;"), 8);
    assert_eq!(returns("int a; return (a = 3) * 2;"), 6);
}

#[test]
fn falling_off_main_returns_zero() {
    assert_eq!(returns("int x = 42;"), 0);
    assert_eq!(returns(""), 0);
    assert_eq!(returns("if (1) return;"), 0);
}

#[test]
fn blocks_share_a_single_frame() {
    assert_eq!(returns("{ int x = 9; } return x;"), 9);
}

#[test]
fn prints_integers_and_strings() {
    let run = run(
        "int main() {
            int x = 6 * 7;
            print_str(\"answer: \");
            print_int(x);
            print_str(\"\\n\");
            print_str(\"answer: \");
            print_int(-1);
            return 0;
        }",
    );

    assert_eq!(run.output, "answer: 42\nanswer: -1");
    assert_eq!(run.exit_code, 0);
}

#[test]
fn identical_literals_share_one_entry() {
    let asm = mipscc::compile(
        "int main() { print_str(\"twice\"); print_str(\"once\"); print_str(\"twice\"); }",
    )
    .unwrap();

    assert_eq!(asm.matches("\"twice\"").count(), 1);
    assert_eq!(asm.matches(".asciiz").count(), 2);
    assert_eq!(common::execute(&asm).output, "twiceoncetwice");
}

#[test]
fn programs_without_strings_have_no_data_section() {
    let asm = mipscc::compile("int main() { return 1; }").unwrap();
    assert!(!asm.contains(".data"));
    assert!(asm.contains(".globl main"));
}

#[test]
fn declarations_take_consecutive_slots() {
    let asm = mipscc::compile("int main() { int a = 1; int b = 2; int c = 3; }").unwrap();

    let a = asm.find("-12($fp)").unwrap();
    let b = asm.find("-16($fp)").unwrap();
    let c = asm.find("-20($fp)").unwrap();
    assert!(a < b && b < c);
}

#[test]
fn missing_semicolon_is_a_syntax_error() {
    let error = mipscc::compile("int main() { return 1 }").unwrap_err();

    assert!(matches!(
        error,
        CompileError::Parse(ref error) if matches!(error.val(), ParserError::UnexpectedToken(..))
    ));
    assert_eq!(error.location().line(), 1);
    assert!(error.to_string().contains("syntax error"));
}

#[test]
fn unknown_character_is_a_lexical_error() {
    let error = mipscc::compile("int main() {\n  int x = 1 @ 2;\n}").unwrap_err();

    assert!(matches!(
        error,
        CompileError::Lex(ref error) if *error.val() == LexerError::BadChar('@')
    ));
    assert_eq!(error.location().line(), 2);
    assert_eq!(error.location().column(), 13);
}

#[test]
fn only_int_main_is_accepted() {
    for source in ["void main() {}", "int foo() {}", "int main(int) {}", "main() {}"] {
        let error = mipscc::compile(source).unwrap_err();
        assert!(
            matches!(
                error,
                CompileError::Parse(ref error) if *error.val() == ParserError::OnlyMain
            ),
            "source: {}",
            source
        );
    }
}

#[test]
fn deep_expressions_run_out_of_registers() {
    let error = mipscc::compile(
        "int main() { return 1 - (2 - (3 - (4 - (5 - (6 - (7 - (8 - (9 - 10)))))))); }",
    )
    .unwrap_err();

    assert!(matches!(
        error,
        CompileError::Codegen(ref error) if *error.val() == CodegenError::OutOfRegisters
    ));
}

#[test]
fn eight_live_values_still_run() {
    assert_eq!(returns("return 1 - (2 - (3 - (4 - (5 - (6 - (7 - 8))))));"), -4);
}

#[test]
fn pathological_nesting_is_an_error() {
    let depth = 100_000;
    for body in [
        format!("return {}1{};", "(".repeat(depth), ")".repeat(depth)),
        format!("return {}1;", "-".repeat(depth)),
    ] {
        let error = mipscc::compile(&format!("int main() {{ {} }}", body)).unwrap_err();
        assert!(matches!(
            error,
            CompileError::Parse(ref error)
                if *error.val() == ParserError::NestingTooDeep(MAX_NESTING)
        ));
    }
}

#[test]
fn nesting_below_the_limit_runs() {
    let depth = MAX_NESTING / 2;
    let parens = format!("return {}7{};", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(returns(&parens), 7);

    let negations = format!("return {}7;", "- ".repeat(depth));
    assert_eq!(returns(&negations), 7);

    let blocks = format!("{}return 3;{}", "{".repeat(depth), "}".repeat(depth));
    assert_eq!(returns(&blocks), 3);
}
