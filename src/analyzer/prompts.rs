// src/analyzer/prompts.rs
use serde_json::Value;

pub fn profile_analysis(posts: &str) -> String {
    format!(
        r#"You are an expert LinkedIn growth strategist and content analyst.

Analyze the following LinkedIn posts from a creator and provide a detailed, structured analysis.

POSTS:
"""
{posts}
"""

Return your analysis as a valid JSON object with EXACTLY these fields:

{{
  "detected_niche": "The primary niche/topic area of the creator (string)",
  "target_audience": "Description of who the content is aimed at (string)",
  "content_strengths": ["Array of 3-5 specific strengths identified in the posts"],
  "content_gaps": ["Array of 3-5 content gaps or missing opportunities"],
  "tone_analysis": {{
    "primary_tone": "The dominant tone (e.g., professional, casual, inspirational)",
    "secondary_tone": "A secondary tone if present",
    "consistency": "How consistent the tone is across posts (high/medium/low)"
  }},
  "growth_opportunities": ["Array of 3-5 actionable growth opportunities"],
  "hashtag_usage": "Assessment of hashtag strategy (string)",
  "cta_effectiveness": "Assessment of calls-to-action usage (string)",
  "posting_patterns": "Observations about posting patterns (string)"
}}

IMPORTANT:
- Return ONLY the JSON object, no markdown, no code blocks, no extra text.
- All fields must be present.
- Arrays must contain 3-5 items each.
- Be specific and actionable in your analysis."#
    )
}

pub fn growth_plan(analysis: &Value, posts: &str) -> String {
    let analysis = serde_json::to_string_pretty(analysis).unwrap_or_else(|_| analysis.to_string());

    format!(
        r#"You are an expert LinkedIn growth strategist.

Based on the following profile analysis and original posts, create a detailed 7-day LinkedIn growth plan.

PROFILE ANALYSIS:
{analysis}

ORIGINAL POSTS:
"""
{posts}
"""

Return a valid JSON object with EXACTLY this structure:

{{
  "plan_title": "Personalized title for the 7-day plan",
  "plan_summary": "Brief overview of the plan strategy",
  "days": [
    {{
      "day": 1,
      "theme": "Day theme (e.g., 'Authority Building')",
      "post_idea": "Detailed post idea with topic and angle",
      "hook": "An attention-grabbing opening line for the post",
      "suggested_cta": "A specific call-to-action to include",
      "engagement_task": "A specific engagement activity to do that day (e.g., 'Comment on 10 posts in your niche')",
      "best_posting_time": "Suggested time to post",
      "content_format": "Format suggestion (text, carousel, poll, video, etc.)"
    }}
  ]
}}

IMPORTANT:
- Return ONLY the JSON object, no markdown, no code blocks, no extra text.
- Include exactly 7 days in the "days" array (day 1 through day 7).
- Each day must have all fields filled with specific, actionable content.
- Make hooks compelling and scroll-stopping.
- CTAs should drive engagement (comments, shares, follows).
- Engagement tasks should be practical and time-bound."#
    )
}
