use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

struct RunResult {
    stdout: String,
    stderr: String,
    code: i32,
}

impl From<Output> for RunResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code().unwrap_or(-1),
        }
    }
}

fn posish() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_posish"));
    cmd.env_remove("POSISH_LOG");
    cmd
}

fn run_with(flags: &[&str], script: &str) -> RunResult {
    posish()
        .args(flags)
        .arg("-c")
        .arg(script)
        .stdin(Stdio::null())
        .output()
        .expect("failed to run posish")
        .into()
}

fn run(script: &str) -> RunResult {
    run_with(&[], script)
}

fn run_stdin(script: &str) -> RunResult {
    let mut child = posish()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn posish");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(script.as_bytes())
        .expect("failed to write script");
    child.wait_with_output().expect("failed to wait for posish").into()
}

/// A fresh scratch directory for one test
fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("posish-it-{}-{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("failed to create scratch dir");
    dir
}

#[test]
fn echo_and_newline() {
    assert_eq!(run("echo a b c").stdout, "a b c\n");
    assert_eq!(run("echo -n a b").stdout, "a b");
    assert_eq!(run("echo").stdout, "\n");
}

#[test]
fn quoting_controls_expansion() {
    let r = run("x='a  b'; echo '$x' \"$x\" $x");
    assert_eq!(r.stdout, "$x a  b a b\n");

    let r = run("echo \"$(echo hi) $((1+1))\" '$(echo hi)'");
    assert_eq!(r.stdout, "hi 2 $(echo hi)\n");

    let r = run("cd /; echo \"*\"");
    assert_eq!(r.stdout, "*\n");
}

#[test]
fn colon_parameter_operators() {
    let r = run("unset VAR; echo \"${VAR:-default}\"; VAR=set; echo \"${VAR:-default}\"");
    assert_eq!(r.stdout, "default\nset\n");

    let r = run("VAR=; echo \"${VAR:=assigned}\"; echo \"$VAR\"");
    assert_eq!(r.stdout, "assigned\nassigned\n");

    let r = run("VAR=x; echo \"[${VAR:+alt}]\"; VAR=; echo \"[${VAR:+alt}]\"");
    assert_eq!(r.stdout, "[alt]\n[]\n");

    let r = run("unset VAR; echo \"${VAR:?is missing}\"; echo after");
    assert_eq!(r.stdout, "");
    assert!(r.stderr.contains("VAR: is missing"), "stderr: {}", r.stderr);
    assert_ne!(r.code, 0);
}

#[test]
fn parameter_pattern_operators() {
    let r = run("p=/usr/local/bin.tar.gz; echo ${p##*/} ${p%.*} ${p%%.*} ${#p}");
    assert_eq!(r.stdout, "bin.tar.gz /usr/local/bin.tar /usr/local/bin 21\n");
}

#[test]
fn arithmetic_expansion() {
    assert_eq!(run("echo $((2+3*4))").stdout, "14\n");
    assert_eq!(run("echo $(( (2+3)*4 ))").stdout, "20\n");
    assert_eq!(run("echo $((7/2)) $((-7/2)) $((7%3))").stdout, "3 -3 1\n");
    assert_eq!(run("i=4; echo $((i * 2 + 1))").stdout, "9\n");

    let r = run("echo $((1/0)); echo after");
    assert_eq!(r.stdout, "after\n");
    assert!(r.stderr.contains("division by zero"), "stderr: {}", r.stderr);
}

#[test]
fn pipelines() {
    assert_eq!(run("echo hello | cat | cat").stdout, "hello\n");
    assert_eq!(run("false | true; echo $?").stdout, "0\n");
    assert_eq!(run("true | false; echo $?").stdout, "1\n");
    assert_eq!(run("printf 'b\\na\\n' | { read first; echo $first; }").stdout, "b\n");
}

#[test]
fn loops_break_and_continue() {
    let r = run("for i in 1 2; do for j in a b; do if [ $j = b ]; then break; fi; echo $i$j; done; done");
    assert_eq!(r.stdout, "1a\n2a\n");

    let r = run("for i in 1 2 3; do if [ $i = 2 ]; then continue; fi; echo $i; done");
    assert_eq!(r.stdout, "1\n3\n");

    let r = run("for i in 1 2; do for j in a b; do break 2; done; echo never; done; echo out");
    assert_eq!(r.stdout, "out\n");

    let r = run("n=0; while [ $n -lt 3 ]; do n=$((n+1)); done; echo $n");
    assert_eq!(r.stdout, "3\n");

    let r = run("n=5; until [ $n -eq 0 ]; do n=$((n-1)); done; echo $n");
    assert_eq!(r.stdout, "0\n");
}

#[test]
fn local_shadows_global_for_call() {
    let r = run("VAR=global; f() { local VAR=local; echo $VAR; }; echo $VAR; f; echo $VAR");
    assert_eq!(r.stdout, "global\nlocal\nglobal\n");
}

#[test]
fn functions_and_positional_parameters() {
    let r = run("f() { echo $# $1 $2; }; set -- outer; f a b; echo $1");
    assert_eq!(r.stdout, "2 a b\nouter\n");

    let r = run("f() { return 3; echo never; }; f; echo $?");
    assert_eq!(r.stdout, "3\n");

    let r = run("f() { if [ $1 -gt 0 ]; then f $(($1 - 1)); else echo bottom; fi; }; f 100");
    assert_eq!(r.stdout, "bottom\n");
}

#[test]
fn exit_in_function_ends_shell() {
    let r = run("f() { echo before; exit 99; }; f; echo no");
    assert_eq!(r.stdout, "before\n");
    assert_eq!(r.code, 99);
}

#[test]
fn exit_status_wraps() {
    assert_eq!(run("exit 300").code, 44);
    assert_eq!(run("false").code, 1);
    assert_eq!(run("(exit 5)").code, 5);
}

#[test]
fn set_positional_has_no_residue() {
    let r = run("set -- start; echo $1; set -- changed; echo $1; set -- longer_string; echo $1; set -- s; echo $1");
    assert_eq!(r.stdout, "start\nchanged\nlonger_string\ns\n");
}

#[test]
fn case_statement() {
    let script = "case $1 in hello) echo match;; *) echo nomatch;; esac";
    let r = posish().args(["-c", script, "sh", "hello"]).output().unwrap();
    assert_eq!(String::from_utf8_lossy(&r.stdout), "match\n");
    let r = posish().args(["-c", script, "sh", "test"]).output().unwrap();
    assert_eq!(String::from_utf8_lossy(&r.stdout), "nomatch\n");

    let r = run("case foo.txt in *.sh|*.txt) echo text;; esac");
    assert_eq!(r.stdout, "text\n");
}

#[test]
fn command_string_arguments() {
    let r = posish().args(["-c", "echo $0 $1 $#", "name", "a", "b"]).output().unwrap();
    assert_eq!(String::from_utf8_lossy(&r.stdout), "name a 2\n");
}

#[test]
fn command_substitution() {
    assert_eq!(run("echo $(echo a; echo b)").stdout, "a b\n");
    assert_eq!(run("echo `echo back`tick").stdout, "backtick\n");
    assert_eq!(run("x=$(printf 'line\\n\\n\\n'); echo \"[$x]\"").stdout, "[line]\n");
    assert_eq!(run("echo $(echo $(echo nested))").stdout, "nested\n");
    assert_eq!(run("x=$(exit 4); echo $?").stdout, "4\n");
}

#[test]
fn subshells_are_isolated() {
    assert_eq!(run("x=1; (x=2; echo $x); echo $x").stdout, "2\n1\n");
    assert_eq!(run("x=1; y=$(x=3; echo $x); echo $x $y").stdout, "1 3\n");
    assert_eq!(run("cd /; (cd /tmp); pwd").stdout, "/\n");
}

#[test]
fn field_splitting_and_globbing() {
    let r = run("IFS=:; x=a:b:c; for i in $x; do echo $i; done");
    assert_eq!(r.stdout, "a\nb\nc\n");

    let dir = scratch_dir("glob");
    std::fs::write(dir.join("one.txt"), "").unwrap();
    std::fs::write(dir.join("two.txt"), "").unwrap();
    std::fs::write(dir.join("three.log"), "").unwrap();
    let r = posish()
        .args(["-c", "cd \"$1\"; echo *.txt; echo *.none; set -f; echo *.txt", "sh"])
        .arg(&dir)
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&r.stdout), "one.txt two.txt\n*.none\n*.txt\n");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn redirections() {
    let dir = scratch_dir("redir");
    let script = "cd \"$1\"; echo hi > f; echo more >> f; cat < f; \
                  echo err 2>&1 >/dev/null 1>&2; cat missing 2> e || echo failed; \
                  exec 3> g; echo three >&3; exec 3>&-; cat g";
    let r = posish().args(["-c", script, "sh"]).arg(&dir).output().unwrap();
    assert_eq!(String::from_utf8_lossy(&r.stdout), "hi\nmore\nerr\nfailed\nthree\n");
    assert!(std::fs::read_to_string(dir.join("e")).unwrap().contains("missing"));

    let r = run("cat < /no/such/posish/file; echo $?");
    assert_eq!(r.stdout, "1\n");
    assert!(r.stderr.contains("/no/such/posish/file: No such file or directory"));

    let r = run("{ echo out; echo err >&2; } 2>&1 | cat");
    assert_eq!(r.stdout, "out\nerr\n");

    let r = posish()
        .args(["-c", "cd \"$1\"; echo a > c; set -C; echo b > c; echo $?; echo c >| c; cat c", "sh"])
        .arg(&dir)
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&r.stdout), "1\nc\n");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn here_documents() {
    let r = run("x=world; cat <<EOF\nhello $x\n$((1+2))\nEOF\n");
    assert_eq!(r.stdout, "hello world\n3\n");

    let r = run("cat <<'EOF'\nno $expansion here\nEOF\n");
    assert_eq!(r.stdout, "no $expansion here\n");

    let r = run("cat <<-EOF\n\t\tindented\n\tEOF\n");
    assert_eq!(r.stdout, "indented\n");

    let r = run("cat <<A; cat <<B\nfirst\nA\nsecond\nB\n");
    assert_eq!(r.stdout, "first\nsecond\n");
}

#[test]
fn and_or_lists() {
    assert_eq!(run("true && echo yes || echo no").stdout, "yes\n");
    assert_eq!(run("false && echo yes || echo no").stdout, "no\n");
    assert_eq!(run("false || false || echo third").stdout, "third\n");
    assert_eq!(run("! false && echo negated").stdout, "negated\n");
}

#[test]
fn cd_and_pwd() {
    assert_eq!(run("cd / && pwd").stdout, "/\n");
    assert_eq!(run("cd /; cd /tmp; cd - >/dev/null; pwd").stdout, "/\n");
    assert_eq!(run("cd /tmp; echo $OLDPWD >/dev/null; cd ..; pwd").stdout, "/\n");

    let r = run("cd /no/such/posish/dir; echo $?");
    assert_eq!(r.stdout, "1\n");
    assert!(r.stderr.starts_with("posish: cd: /no/such/posish/dir:"), "stderr: {}", r.stderr);
}

#[test]
fn aliases_from_standard_input() {
    let r = run_stdin("alias greet='echo hi'\ngreet there\nunalias greet\ngreet 2>/dev/null || echo gone\n");
    assert_eq!(r.stdout, "hi there\ngone\n");

    let r = run_stdin("alias both='echo one; echo two'\nboth\nalias\n");
    assert_eq!(r.stdout, "one\ntwo\nalias both='echo one; echo two'\n");
}

#[test]
fn script_file_and_missing_script() {
    let dir = scratch_dir("script");
    let path = dir.join("s.sh");
    std::fs::write(&path, "echo \"$0\" | grep -q s.sh && echo named\necho $1 $2\n").unwrap();
    let r: RunResult = posish().arg(&path).args(["x", "y"]).output().unwrap().into();
    assert_eq!(r.stdout, "named\nx y\n");

    let r: RunResult = posish().arg(dir.join("absent.sh")).output().unwrap().into();
    assert_eq!(r.code, 127);
    assert!(r.stderr.contains("absent.sh: No such file or directory"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn command_errors() {
    let r = run("no_such_command_posish; echo $?");
    assert_eq!(r.stdout, "127\n");
    assert_eq!(r.stderr, "posish: no_such_command_posish: command not found\n");

    let r = run("/etc; echo $?");
    assert_eq!(r.stdout, "126\n");

    let r = run("echo before; if then");
    assert_eq!(r.stdout, "");
    assert_eq!(r.code, 2);
    assert!(r.stderr.starts_with("posish: line 1:"), "stderr: {}", r.stderr);
}

#[test]
fn readonly_assignment_is_rejected() {
    let r = run("readonly R=1; R=2; echo $R");
    assert_eq!(r.stdout, "1\n");
    assert!(r.stderr.contains("R: readonly variable"));
}

#[test]
fn shell_options() {
    let r = run_with(&["-e"], "false; echo no");
    assert_eq!(r.stdout, "");
    assert_eq!(r.code, 1);

    let r = run_with(&["-x"], "echo hi");
    assert_eq!(r.stdout, "hi\n");
    assert!(r.stderr.contains("+ echo hi"));

    let r = run("set -u; echo $undefined_posish; echo no");
    assert_eq!(r.stdout, "");
    assert!(r.stderr.contains("undefined_posish: parameter not set"));
}

#[test]
fn builtins_end_to_end() {
    assert_eq!(run("printf '%s-%03d|%x\\n' a 5 255").stdout, "a-005|ff\n");
    assert_eq!(run("printf '%s\\n' a b c").stdout, "a\nb\nc\n");
    assert_eq!(run("echo 'a b  c' | { read x y; echo \"$y\"; }").stdout, "b  c\n");
    assert_eq!(run("eval 'x=1; echo $x'").stdout, "1\n");
    assert_eq!(run("[ 3 -gt 2 ] && test -n x && echo ok").stdout, "ok\n");
    assert_eq!(run("type cd").stdout, "cd is a shell builtin\n");
    assert_eq!(run("f() { :; }; command -v f echo").stdout, "f\necho\n");
    assert_eq!(run("set -- a b c; shift 2; echo $@").stdout, "c\n");
    assert_eq!(run("export E=exported; sh -c 'echo $E'").stdout, "exported\n");
    assert_eq!(run("E=prefix sh -c 'echo $E'; echo \"[$E]\"").stdout, "prefix\n[]\n");
}

#[test]
fn getopts_loop() {
    let script = "while getopts ab:c opt; do case $opt in b) echo \"b=$OPTARG\";; ?) echo $opt;; esac; done; \
                  shift $((OPTIND - 1)); echo rest $@";
    let r = posish()
        .args(["-c", script, "sh", "-ac", "-b", "val", "file"])
        .output()
        .unwrap();
    assert_eq!(String::from_utf8_lossy(&r.stdout), "a\nc\nb=val\nrest file\n");
}

#[test]
fn background_and_wait() {
    assert_eq!(run("(exit 3) & wait $!; echo $?").stdout, "3\n");
    assert_eq!(run("echo bg > /dev/null & wait; echo done").stdout, "done\n");
}

#[test]
fn finished_background_jobs_leave_no_zombies() {
    let r = run("for i in 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20; do true & done; \
                 sleep 0.3; ps -o stat= --ppid $$ | grep -c Z");
    assert_eq!(r.stdout, "0\n");

    let r = run("(exit 4) & p=$!; sleep 0.2; true; wait $p; echo $?");
    assert_eq!(r.stdout, "4\n");
}

#[test]
fn non_utf8_bytes_pass_through() {
    let raw = |script: &str| posish().args(["-c", script]).output().expect("failed to run posish").stdout;

    assert_eq!(raw("printf '\\377'"), vec![0xFF]);
    assert_eq!(raw("x=$(printf '\\377\\200'); printf '%s' \"$x\""), vec![0xFF, 0x80]);
    assert_eq!(raw("x=$(/usr/bin/printf '\\377'); echo \"$x\""), vec![0xFF, b'\n']);
    assert_eq!(raw("printf 'a\\351b\\n' | { read v; printf '%s' \"${#v}:$v\"; }"), b"3:a\xe9b".to_vec());
}

#[test]
fn star_joins_with_first_ifs_character() {
    assert_eq!(run("IFS=,; set -- a b; echo \"$*\"").stdout, "a,b\n");
    assert_eq!(run("IFS=; set -- a b; echo \"$*\"").stdout, "ab\n");
}

#[test]
fn assign_default_on_readonly_fails() {
    let r = run("readonly R; : ${R:=x}; echo \"$?[$R]\"");
    assert_eq!(r.stdout, "1[]\n");
    assert!(r.stderr.contains("R: readonly variable"), "stderr: {}", r.stderr);
}

#[test]
fn signal_death_reports_128_plus_signal() {
    assert_eq!(run("sh -c 'kill -9 $$'; echo $?").stdout, "137\n");
}

#[test]
fn trap_on_exit() {
    let r = run("trap 'echo bye $?' EXIT; echo hi; false");
    assert_eq!(r.stdout, "hi\nbye 1\n");
    assert_eq!(r.code, 1);

    assert_eq!(run("trap 'echo bye' EXIT; exit 3").code, 3);
    assert_eq!(run("trap 'echo never' EXIT; trap - EXIT; echo x").stdout, "x\n");
    assert_eq!(run("trap 'echo a' 0; trap").stdout, "trap -- 'echo a' EXIT\na\n");
    assert_eq!(run("(trap 'echo inner' EXIT; echo body); echo after").stdout, "body\ninner\nafter\n");
    assert_eq!(run("trap 'echo outer' EXIT; (echo sub)").stdout, "sub\nouter\n");

    let r = run("trap 'echo x' BOGUS; echo $?");
    assert_eq!(r.stdout, "1\n");
    assert!(r.stderr.contains("BOGUS: bad trap"));
}

#[test]
fn trap_on_signal() {
    assert_eq!(run("trap 'echo got' USR1; kill -USR1 $$; echo next").stdout, "got\nnext\n");
    assert_eq!(run("trap '' TERM; kill -TERM $$; echo alive").stdout, "alive\n");
}

#[test]
fn umask_builtin() {
    assert_eq!(run("umask 027; umask").stdout, "0027\n");
    assert_eq!(run("umask 022; umask -S").stdout, "u=rwx,g=rx,o=rx\n");
    assert_eq!(run("umask u=rwx,g=,o=; umask").stdout, "0077\n");

    let dir = scratch_dir("umask");
    let script = format!("umask 077; : > {}/f; ls -l {}/f", dir.display(), dir.display());
    assert!(run(&script).stdout.starts_with("-rw-------"));

    let r = run("umask 999; echo $?");
    assert_eq!(r.stdout, "1\n");
    assert!(r.stderr.contains("umask: 999: invalid mode"));
}

#[test]
fn times_builtin() {
    let out = run("times").stdout;
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains('m') && lines[0].ends_with('s'));
}
