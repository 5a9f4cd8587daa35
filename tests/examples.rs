mod common;
use common::output_of;

#[test]
fn fibonacci() {
    assert_eq!(
        output_of(include_str!("../demos/fibonacci.mel")),
        ["0", "1", "1", "2", "3", "5", "8", "13", "21", "34", "Done!"]
    );
}

#[test]
fn factorial() {
    assert_eq!(
        output_of(include_str!("../demos/factorial.mel")),
        ["Factorial of", "5", "is", "120"]
    );
}

#[test]
fn sum() {
    assert_eq!(
        output_of(include_str!("../demos/sum.mel")),
        ["Sum of first", "100", "numbers is", "5050"]
    );
}

#[test]
fn even_odd() {
    assert_eq!(
        output_of(include_str!("../demos/even_odd.mel")),
        ["Even:", "10", "Odd:", "10"]
    );
}

#[test]
fn power() {
    assert_eq!(
        output_of(include_str!("../demos/power.mel")),
        ["Result:", "1024"]
    );
}

#[test]
fn long_operator_chain() {
    let terms = vec!["1"; 3000].join(" + ");
    let src = format!("var total = {terms};\nprint(total);\nprint(total - 1 - 1 - 1);");
    assert_eq!(output_of(&src), ["3000", "2997"]);
}
