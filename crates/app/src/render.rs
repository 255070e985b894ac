//! Plain-text output for the terminal.

use std::io::{self, Write};

use mnemo_core::model::{Evaluation, Question, QuestionType, Session, Statistics};
use services::SessionProgress;

pub fn session_started(w: &mut dyn Write, session: &Session) -> io::Result<()> {
    writeln!(w, "session {} ({})", session.id(), session.word())?;
    for question in session.questions() {
        writeln!(w, "  [{}] {}", question.id(), question.question_text())?;
    }
    Ok(())
}

pub fn evaluation(w: &mut dyn Write, evaluation: &Evaluation) -> io::Result<()> {
    writeln!(w, "score: {}", evaluation.score)?;
    writeln!(w, "{}", evaluation.feedback)?;
    for strength in &evaluation.strengths {
        writeln!(w, "  + {strength}")?;
    }
    for improvement in &evaluation.improvements {
        writeln!(w, "  - {improvement}")?;
    }
    Ok(())
}

pub fn session_completed(w: &mut dyn Write, session: &Session) -> io::Result<()> {
    writeln!(
        w,
        "completed {}: overall score {} ({}/{} answered)",
        session.id(),
        session.overall_score(),
        session.answered_count(),
        session.total_questions()
    )
}

pub fn session_detail(w: &mut dyn Write, session: &Session) -> io::Result<()> {
    writeln!(w, "session {} ({})", session.id(), session.state())?;
    writeln!(w, "{}: {}", session.word(), session.explanation())?;
    if session.is_completed() {
        writeln!(w, "overall score: {}", session.overall_score())?;
    }
    for question in session.questions() {
        let status = session
            .evaluation(question.id())
            .map_or_else(|| "open".to_string(), |e| format!("{}/100", e.score));
        writeln!(
            w,
            "  [{}] {} ({status})",
            question.id(),
            question.question_type().display_name()
        )?;
        if let Some(response) = session.response(question.id()) {
            writeln!(w, "      {response}")?;
        }
    }
    Ok(())
}

pub fn session_list(w: &mut dyn Write, sessions: &[Session]) -> io::Result<()> {
    if sessions.is_empty() {
        return writeln!(w, "no sessions");
    }
    for session in sessions {
        writeln!(
            w,
            "{}  {}  {}  {}%",
            session.id(),
            session.word(),
            session.state(),
            session.progress_percent()
        )?;
    }
    Ok(())
}

pub fn next_question(w: &mut dyn Write, question: Option<&Question>) -> io::Result<()> {
    let Some(question) = question else {
        return writeln!(w, "all questions answered");
    };
    writeln!(w, "[{}] {}", question.id(), question.question_text())?;
    for hint in question.hints() {
        writeln!(w, "  hint: {hint}")?;
    }
    Ok(())
}

pub fn progress(w: &mut dyn Write, progress: &SessionProgress) -> io::Result<()> {
    writeln!(
        w,
        "{}/{} answered ({}%), {}",
        progress.answered, progress.total, progress.percent, progress.state
    )
}

pub fn statistics(w: &mut dyn Write, stats: &Statistics) -> io::Result<()> {
    let kind = |t: Option<QuestionType>| t.map_or("none", QuestionType::as_str);
    writeln!(w, "completed sessions: {}", stats.total_sessions)?;
    writeln!(w, "average score:      {}", stats.average_score)?;
    writeln!(w, "questions answered: {}", stats.questions_answered)?;
    writeln!(w, "strongest type:     {}", kind(stats.strongest_question_type))?;
    writeln!(w, "weakest type:       {}", kind(stats.weakest_question_type))?;
    writeln!(w, "improvement:        {:+}%", stats.improvement_rate)?;
    for bucket in &stats.question_types {
        writeln!(
            w,
            "  {:<12} {:>3} ({} answers)",
            bucket.question_type.as_str(),
            bucket.average_score,
            bucket.count
        )?;
    }
    Ok(())
}
